//! Error types

use crate::collector::CollectError;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error("snapshot task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
