//! Filesystem activity source for the refresher

use crate::error::{MonitorError, Result};
use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Keeps a watch on one directory alive; dropping it stops the watch.
pub struct FsWatch {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl FsWatch {
    /// Watch `path` (non-recursively) for read or write activity.
    ///
    /// Each matching event yields one `()` on the returned channel; the
    /// consumer is expected to coalesce them. Events touching only paths in
    /// `ignored` are dropped, so a log file inside the watched directory
    /// cannot retrigger the refresh that wrote to it.
    pub fn start(path: &Path, ignored: &[PathBuf]) -> Result<(Self, mpsc::UnboundedReceiver<()>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let watch_error = |source: notify::Error| MonitorError::Watch {
            path: path.display().to_string(),
            source,
        };
        let ignored: Vec<PathBuf> = ignored
            .iter()
            .map(|p| fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event, &ignored) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!("Watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(watch_error)?;
        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;
        info!("Watching {:?} for activity", path);

        Ok((
            Self {
                path: path.to_path_buf(),
                _watcher: watcher,
            },
            rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Reads and writes count; creation, removal and metadata events do not.
pub fn is_activity(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Access(_) | EventKind::Modify(_))
}

/// Activity on at least one path outside `ignored` (or on no path at all).
pub fn is_relevant(event: &Event, ignored: &[PathBuf]) -> bool {
    if !is_activity(&event.kind) {
        return false;
    }
    event.paths.is_empty() || event.paths.iter().any(|p| !is_ignored(p, ignored))
}

fn is_ignored(path: &Path, ignored: &[PathBuf]) -> bool {
    if ignored.iter().any(|i| i == path) {
        return true;
    }
    let same_name = ignored.iter().any(|i| i.file_name() == path.file_name());
    same_name
        && fs::canonicalize(path)
            .map(|real| ignored.contains(&real))
            .unwrap_or(false)
}
