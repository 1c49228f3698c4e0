//! The single owner of view state
//!
//! Refreshers, the input reader and the signal listener all run as separate
//! tasks and talk to the coordinator only through one request channel. The
//! coordinator applies requests one at a time, in arrival order, and redraws
//! after every one of them.

use crate::error::{MonitorError, Result};
use crate::input::Command;
use crate::protocol::{Request, ShutdownReason};
use crate::state::ViewState;
use crate::ui;
use chrono::Local;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Somewhere a view can be drawn.
pub trait Surface {
    /// Current height in character rows.
    fn rows(&mut self) -> std::io::Result<u16>;
    fn draw(&mut self, view: &ViewState) -> std::io::Result<()>;
}

impl<B: Backend> Surface for Terminal<B> {
    fn rows(&mut self) -> std::io::Result<u16> {
        Ok(self.size()?.height)
    }

    fn draw(&mut self, view: &ViewState) -> std::io::Result<()> {
        let now = Local::now();
        Terminal::draw(self, |frame| ui::draw(frame, view, now))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    ShuttingDown(ShutdownReason),
}

pub struct Coordinator<S> {
    view: ViewState,
    surface: S,
    phase: Phase,
    shutdown: watch::Sender<bool>,
    redraws: u64,
}

impl<S: Surface> Coordinator<S> {
    pub fn new(surface: S, shutdown: watch::Sender<bool>) -> Self {
        Self {
            view: ViewState::new(),
            surface,
            phase: Phase::Running,
            shutdown,
            redraws: 0,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Apply one request and redraw.
    ///
    /// Shutdown requests change phase without drawing, so nothing new lands
    /// on screen while the terminal is being released.
    pub fn apply(&mut self, request: Request) -> Result<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }
        let rows = self.surface.rows()?;
        self.view
            .set_visible_rows(usize::from(rows.saturating_sub(ui::BORDER_ROWS)));

        match request {
            Request::ReplaceSnapshot { trigger, snapshot } => {
                debug!("Applying {} snapshot of {} processes", trigger, snapshot.len());
                self.view.replace_snapshot(snapshot);
            }
            Request::Key(Command::Up) => {
                self.view.select_up();
            }
            Request::Key(Command::Down) => {
                self.view.select_down();
            }
            Request::Key(Command::Noop) | Request::Redraw => {}
            Request::Key(Command::Quit) => {
                self.begin_shutdown(ShutdownReason::QuitKey);
                return Ok(());
            }
            Request::Shutdown(reason) => {
                self.begin_shutdown(reason);
                return Ok(());
            }
            Request::InputFailed(e) => {
                self.begin_shutdown(ShutdownReason::Disconnected);
                return Err(MonitorError::Terminal(e));
            }
        }
        self.redraw()
    }

    pub fn redraw(&mut self) -> Result<()> {
        self.surface.draw(&self.view)?;
        self.redraws += 1;
        Ok(())
    }

    /// Draw the initial frame, then apply requests until shutdown.
    ///
    /// Returns once the coordinator has left `Running`; no further requests
    /// are read after that. Any error also flips the shutdown signal so the
    /// other tasks stop.
    pub async fn run(&mut self, requests: &mut mpsc::UnboundedReceiver<Request>) -> Result<()> {
        let result = self.run_inner(requests).await;
        if result.is_err() {
            let _ = self.shutdown.send(true);
        }
        result
    }

    async fn run_inner(&mut self, requests: &mut mpsc::UnboundedReceiver<Request>) -> Result<()> {
        let rows = self.surface.rows()?;
        self.view
            .set_visible_rows(usize::from(rows.saturating_sub(ui::BORDER_ROWS)));
        self.redraw()?;

        while self.phase == Phase::Running {
            match requests.recv().await {
                Some(request) => self.apply(request)?,
                None => self.begin_shutdown(ShutdownReason::Disconnected),
            }
        }
        Ok(())
    }

    fn begin_shutdown(&mut self, reason: ShutdownReason) {
        if self.phase != Phase::Running {
            return;
        }
        info!("Shutting down ({:?})", reason);
        self.phase = Phase::ShuttingDown(reason);
        let _ = self.shutdown.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{ProcessRecord, Snapshot};
    use crate::protocol::Trigger;

    /// Records each drawn view.
    struct Recording {
        rows: u16,
        frames: Vec<ViewState>,
        fail: bool,
    }

    impl Recording {
        fn new(rows: u16) -> Self {
            Self {
                rows,
                frames: Vec::new(),
                fail: false,
            }
        }
    }

    impl Surface for Recording {
        fn rows(&mut self) -> std::io::Result<u16> {
            Ok(self.rows)
        }

        fn draw(&mut self, view: &ViewState) -> std::io::Result<()> {
            if self.fail {
                return Err(std::io::Error::other("broken pipe"));
            }
            self.frames.push(view.clone());
            Ok(())
        }
    }

    fn snapshot(pids: &[u32]) -> Snapshot {
        pids.iter()
            .map(|&pid| ProcessRecord {
                pid,
                owner: "root".to_string(),
                command: "cmd".to_string(),
            })
            .collect()
    }

    fn replace(trigger: Trigger, pids: &[u32]) -> Request {
        Request::ReplaceSnapshot {
            trigger,
            snapshot: snapshot(pids),
        }
    }

    #[test]
    fn test_every_key_redraws() {
        let (tx, _rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), tx);
        coordinator.apply(replace(Trigger::Timer, &[1, 2, 3])).unwrap();
        coordinator.apply(Request::Key(Command::Down)).unwrap();
        coordinator.apply(Request::Key(Command::Noop)).unwrap();
        coordinator.apply(Request::Key(Command::Up)).unwrap();
        coordinator.apply(Request::Key(Command::Up)).unwrap();

        assert_eq!(coordinator.redraws(), 5);
        let selections: Vec<_> = coordinator
            .surface()
            .frames
            .iter()
            .map(|v| v.selected_index())
            .collect();
        assert_eq!(
            selections,
            vec![Some(0), Some(1), Some(1), Some(0), Some(0)]
        );
    }

    #[test]
    fn test_visible_rows_follow_surface_height() {
        let (tx, _rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), tx);
        coordinator.apply(Request::Redraw).unwrap();
        assert_eq!(coordinator.view().visible_rows(), 10);
    }

    #[test]
    fn test_refresh_shrink_clamps_selection() {
        let (tx, _rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(20), tx);
        coordinator
            .apply(replace(Trigger::Timer, &[1, 2, 3, 4, 5]))
            .unwrap();
        for _ in 0..4 {
            coordinator.apply(Request::Key(Command::Down)).unwrap();
        }
        assert_eq!(coordinator.view().selected_index(), Some(4));
        coordinator
            .apply(replace(Trigger::Filesystem, &[1, 2]))
            .unwrap();
        assert_eq!(coordinator.view().selected_index(), Some(1));
    }

    #[test]
    fn test_quit_signals_shutdown_without_drawing() {
        let (tx, rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), tx);
        coordinator.apply(Request::Key(Command::Quit)).unwrap();
        assert_eq!(
            coordinator.phase(),
            Phase::ShuttingDown(ShutdownReason::QuitKey)
        );
        assert!(*rx.borrow());
        assert_eq!(coordinator.redraws(), 0);

        coordinator.apply(Request::Key(Command::Down)).unwrap();
        assert_eq!(coordinator.redraws(), 0);
    }

    #[tokio::test]
    async fn test_simultaneous_triggers_apply_in_order_with_two_redraws() {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), shutdown_tx);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let timer = tx.clone();
        let fs = tx.clone();
        let (a, b) = tokio::join!(
            async move { timer.send(replace(Trigger::Timer, &[1, 2, 3])) },
            async move { fs.send(replace(Trigger::Filesystem, &[4, 5])) },
        );
        a.unwrap();
        b.unwrap();
        tx.send(Request::Shutdown(ShutdownReason::Interrupt))
            .unwrap();

        coordinator.run(&mut rx).await.unwrap();

        let frames = &coordinator.surface().frames;
        // Initial frame plus one per applied snapshot.
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].snapshot().len(), 3);
        assert_eq!(frames[2].snapshot().len(), 2);
        assert_eq!(coordinator.view().snapshot().records()[0].pid, 4);
        assert_eq!(
            coordinator.phase(),
            Phase::ShuttingDown(ShutdownReason::Interrupt)
        );
    }

    #[tokio::test]
    async fn test_closed_channel_shuts_down() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), shutdown_tx);
        let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
        drop(tx);
        coordinator.run(&mut rx).await.unwrap();
        assert_eq!(
            coordinator.phase(),
            Phase::ShuttingDown(ShutdownReason::Disconnected)
        );
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test]
    async fn test_draw_failure_is_fatal() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut surface = Recording::new(12);
        surface.fail = true;
        let mut coordinator = Coordinator::new(surface, shutdown_tx);
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let result = coordinator.run(&mut rx).await;
        assert!(matches!(result, Err(MonitorError::Terminal(_))));
        assert!(*shutdown_rx.borrow());
    }

    #[tokio::test]
    async fn test_input_failure_is_fatal() {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let mut coordinator = Coordinator::new(Recording::new(12), shutdown_tx);
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Request::InputFailed(std::io::Error::other("eof")))
            .unwrap();
        let result = coordinator.run(&mut rx).await;
        assert!(matches!(result, Err(MonitorError::Terminal(_))));
    }
}
