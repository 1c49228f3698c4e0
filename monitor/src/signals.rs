//! SIGINT/SIGTERM handling: both act like the quit key

use crate::protocol::{Request, ShutdownReason};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tracing::info;

pub struct SignalListener {
    interrupt: Signal,
    terminate: Signal,
}

impl SignalListener {
    /// Install the handlers. Fails only if the runtime cannot register them.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the first signal (or shutdown) and submit a shutdown request.
    pub async fn run(
        mut self,
        requests: mpsc::UnboundedSender<Request>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let reason = tokio::select! {
            _ = shutdown.changed() => return,
            _ = self.interrupt.recv() => ShutdownReason::Interrupt,
            _ = self.terminate.recv() => ShutdownReason::Terminate,
        };
        info!("Received {:?}", reason);
        let _ = requests.send(Request::Shutdown(reason));
    }
}
