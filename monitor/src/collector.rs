//! Process snapshot collection (reads /proc on Linux)

mod linux;
mod users;

pub use linux::LinuxProcessCollector;
pub use users::{CachedUsers, SystemUsers, UserDirectory};

use std::path::PathBuf;

/// Owner shown when the status record or the user directory lookup fails.
pub const UNKNOWN_OWNER: &str = "Unknown";
/// Command shown when the argument vector is unreadable or empty.
pub const UNREADABLE_COMMAND: &str = "N/A";
/// Upper bound on records kept per snapshot.
pub const DEFAULT_MAX_RECORDS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub owner: String,
    pub command: String,
}

/// One complete enumeration of the process registry.
///
/// Records keep the order the registry yielded them in. `truncated` is set
/// when the scan stopped at the record cap while more entries remained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<ProcessRecord>,
    truncated: bool,
}

impl Snapshot {
    pub fn new(records: Vec<ProcessRecord>, truncated: bool) -> Self {
        Self { records, truncated }
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ProcessRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl FromIterator<ProcessRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ProcessRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect(), false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to read process registry {}: {source}", path.display())]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait ProcessCollector: Send + Sync {
    /// Enumerate at most `max_records` processes.
    fn snapshot(&self, max_records: usize) -> Result<Snapshot, CollectError>;
}
