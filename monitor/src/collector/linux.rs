use super::{
    CachedUsers, CollectError, ProcessCollector, ProcessRecord, Snapshot, SystemUsers,
    UserDirectory, UNKNOWN_OWNER, UNREADABLE_COMMAND,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Longest command kept per record, in bytes.
pub const MAX_COMMAND_BYTES: usize = 256;

const PROC_ROOT: &str = "/proc";

pub struct LinuxProcessCollector<U = CachedUsers<SystemUsers>> {
    root: PathBuf,
    users: U,
}

impl LinuxProcessCollector {
    pub fn new() -> Self {
        Self::with_root(PROC_ROOT, CachedUsers::new(SystemUsers))
    }
}

impl Default for LinuxProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: UserDirectory> LinuxProcessCollector<U> {
    /// Collector over an arbitrary procfs-shaped directory.
    pub fn with_root(root: impl Into<PathBuf>, users: U) -> Self {
        Self {
            root: root.into(),
            users,
        }
    }

    /// Resolve one pid. Never fails: unreadable fields get placeholders.
    pub fn get_process(&self, pid: u32) -> ProcessRecord {
        let proc_dir = self.root.join(pid.to_string());
        ProcessRecord {
            pid,
            owner: self.read_owner(&proc_dir),
            command: read_command(&proc_dir),
        }
    }

    fn read_owner(&self, proc_dir: &Path) -> String {
        let status = match fs::read_to_string(proc_dir.join("status")) {
            Ok(status) => status,
            Err(e) => {
                trace!("status unreadable for {:?}: {}", proc_dir, e);
                return UNKNOWN_OWNER.to_string();
            }
        };
        parse_uid(&status)
            .and_then(|uid| self.users.name_of(uid))
            .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
    }
}

impl<U: UserDirectory> ProcessCollector for LinuxProcessCollector<U> {
    fn snapshot(&self, max_records: usize) -> Result<Snapshot, CollectError> {
        let entries = fs::read_dir(&self.root).map_err(|source| CollectError::Registry {
            path: self.root.clone(),
            source,
        })?;

        let mut records = Vec::new();
        let mut truncated = false;
        for entry in entries.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(parse_pid) else {
                continue;
            };
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if records.len() >= max_records {
                truncated = true;
                break;
            }
            records.push(self.get_process(pid));
        }
        Ok(Snapshot::new(records, truncated))
    }
}

fn parse_pid(name: &str) -> Option<u32> {
    name.parse::<u32>().ok().filter(|pid| *pid > 0)
}

fn read_command(proc_dir: &Path) -> String {
    match fs::read(proc_dir.join("cmdline")) {
        Ok(raw) => format_command(&raw).unwrap_or_else(|| UNREADABLE_COMMAND.to_string()),
        Err(e) => {
            trace!("cmdline unreadable for {:?}: {}", proc_dir, e);
            UNREADABLE_COMMAND.to_string()
        }
    }
}

/// Join a NUL-separated argument vector with spaces, capped at
/// `MAX_COMMAND_BYTES` on a char boundary. `None` when nothing is left.
pub fn format_command(raw: &[u8]) -> Option<String> {
    let joined = String::from_utf8_lossy(raw).replace('\0', " ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut end = trimmed.len().min(MAX_COMMAND_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    Some(trimmed[..end].trim_end().to_string())
}

/// Real uid from a `/proc/<pid>/status` record.
pub fn parse_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|uid| uid.parse().ok())
}
