//! Snapshot refresh triggers: a fixed timer and filesystem activity

use crate::collector::{ProcessCollector, Snapshot};
use crate::error::Result;
use crate::protocol::{Request, Trigger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Rebuilds snapshots from a collector and submits them to the coordinator.
///
/// The refresher never touches view state; it only produces snapshots and
/// hands them over by value.
pub struct Refresher<C> {
    collector: Arc<C>,
    max_records: usize,
}

impl<C: ProcessCollector + 'static> Refresher<C> {
    pub fn new(collector: Arc<C>, max_records: usize) -> Self {
        Self {
            collector,
            max_records,
        }
    }

    /// Take one snapshot on the blocking pool.
    pub async fn refresh(&self) -> Result<Snapshot> {
        let collector = Arc::clone(&self.collector);
        let max_records = self.max_records;
        let snapshot =
            tokio::task::spawn_blocking(move || collector.snapshot(max_records)).await??;
        Ok(snapshot)
    }

    /// Refresh and submit. Returns `false` once the coordinator is gone.
    async fn submit(&self, trigger: Trigger, requests: &mpsc::UnboundedSender<Request>) -> bool {
        match self.refresh().await {
            Ok(snapshot) => {
                debug!(
                    "{} refresh: {} processes{}",
                    trigger,
                    snapshot.len(),
                    if snapshot.is_truncated() { " (truncated)" } else { "" }
                );
                requests
                    .send(Request::ReplaceSnapshot { trigger, snapshot })
                    .is_ok()
            }
            Err(e) => {
                warn!("Skipping {} refresh: {}", trigger, e);
                !requests.is_closed()
            }
        }
    }

    /// Refresh every `period`, starting immediately.
    pub async fn run_timer(
        self: Arc<Self>,
        period: Duration,
        requests: mpsc::UnboundedSender<Request>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Refreshing every {:?}", period);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {
                    if !self.submit(Trigger::Timer, &requests).await {
                        break;
                    }
                }
            }
        }
        debug!("Timer refresher stopped");
    }

    /// Refresh once per burst of filesystem activity.
    ///
    /// Every event already queued when the task wakes is drained before the
    /// refresh, so a burst costs one snapshot rather than one per event.
    pub async fn run_watch(
        self: Arc<Self>,
        mut activity: mpsc::UnboundedReceiver<()>,
        requests: mpsc::UnboundedSender<Request>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = activity.recv() => {
                    if event.is_none() {
                        break;
                    }
                    let mut coalesced = 1usize;
                    while activity.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    debug!("Filesystem activity: {} events coalesced", coalesced);
                    if !self.submit(Trigger::Filesystem, &requests).await {
                        break;
                    }
                }
            }
        }
        debug!("Filesystem refresher stopped");
    }
}
