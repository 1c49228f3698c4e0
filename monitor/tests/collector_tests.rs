#![allow(clippy::unwrap_used)]

use procspy::collector::{
    CollectError, LinuxProcessCollector, ProcessCollector, UserDirectory, UNKNOWN_OWNER,
    UNREADABLE_COMMAND,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct FixedUsers(HashMap<u32, String>);

impl UserDirectory for FixedUsers {
    fn name_of(&self, uid: u32) -> Option<String> {
        self.0.get(&uid).cloned()
    }
}

fn users() -> FixedUsers {
    FixedUsers(HashMap::from([
        (0, "root".to_string()),
        (1000, "alice".to_string()),
    ]))
}

fn add_process(root: &Path, pid: &str, cmdline: Option<&[u8]>, uid: Option<u32>) {
    let dir = root.join(pid);
    fs::create_dir_all(&dir).unwrap();
    if let Some(cmdline) = cmdline {
        fs::write(dir.join("cmdline"), cmdline).unwrap();
    }
    if let Some(uid) = uid {
        let status = format!("Name:\tx\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t0\n");
        fs::write(dir.join("status"), status).unwrap();
    }
}

#[test]
fn test_list_processes_returns_current_process() {
    let collector = LinuxProcessCollector::new();
    let snapshot = collector.snapshot(usize::MAX).unwrap();
    let current_pid = std::process::id();
    let found = snapshot.records().iter().any(|p| p.pid == current_pid);
    assert!(found, "Current process should be in the list");
    assert!(!snapshot.is_truncated());
}

#[test]
fn test_get_process_resolves_current_process() {
    let collector = LinuxProcessCollector::new();
    let current_pid = std::process::id();
    let process = collector.get_process(current_pid);
    assert_eq!(process.pid, current_pid);
    assert_ne!(process.command, UNREADABLE_COMMAND);
}

#[test]
fn test_get_process_placeholders_for_missing_pid() {
    let collector = LinuxProcessCollector::new();
    let process = collector.get_process(999_999_999);
    assert_eq!(process.owner, UNKNOWN_OWNER);
    assert_eq!(process.command, UNREADABLE_COMMAND);
}

#[test]
fn test_fake_registry_resolution() {
    let root = TempDir::new().unwrap();
    add_process(root.path(), "1", Some(b"/sbin/init\0splash\0"), Some(0));
    add_process(root.path(), "1000", Some(b"bash\0"), Some(1000));
    fs::create_dir(root.path().join("self")).unwrap();
    fs::create_dir(root.path().join("0")).unwrap();
    fs::write(root.path().join("77"), b"not a directory").unwrap();

    let collector = LinuxProcessCollector::with_root(root.path(), users());
    let mut records = collector.snapshot(16).unwrap().records().to_vec();
    records.sort_by_key(|r| r.pid);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].pid, 1);
    assert_eq!(records[0].owner, "root");
    assert_eq!(records[0].command, "/sbin/init splash");
    assert_eq!(records[1].owner, "alice");
    assert_eq!(records[1].command, "bash");
}

#[test]
fn test_unreadable_status_yields_unknown_owner() {
    let root = TempDir::new().unwrap();
    add_process(root.path(), "10", Some(b"sleep\x0060\0"), None);
    add_process(root.path(), "11", None, None);
    add_process(root.path(), "12", Some(b"top\0"), Some(0));

    let collector = LinuxProcessCollector::with_root(root.path(), users());
    let snapshot = collector.snapshot(16).unwrap();
    let by_pid = |pid| {
        snapshot
            .records()
            .iter()
            .find(|r| r.pid == pid)
            .cloned()
            .unwrap()
    };

    assert_eq!(snapshot.len(), 3);
    assert_eq!(by_pid(10).owner, UNKNOWN_OWNER);
    assert_eq!(by_pid(10).command, "sleep 60");
    assert_eq!(by_pid(11).owner, UNKNOWN_OWNER);
    assert_eq!(by_pid(11).command, UNREADABLE_COMMAND);
    assert_eq!(by_pid(12).owner, "root");
}

#[test]
fn test_unknown_uid_and_kernel_thread() {
    let root = TempDir::new().unwrap();
    add_process(root.path(), "2", Some(b""), Some(4242));

    let collector = LinuxProcessCollector::with_root(root.path(), users());
    let snapshot = collector.snapshot(16).unwrap();
    assert_eq!(snapshot.records()[0].owner, UNKNOWN_OWNER);
    assert_eq!(snapshot.records()[0].command, UNREADABLE_COMMAND);
}

#[test]
fn test_cap_sets_truncated_flag() {
    let root = TempDir::new().unwrap();
    for pid in 1..=5 {
        add_process(root.path(), &pid.to_string(), Some(b"x\0"), Some(0));
    }
    let collector = LinuxProcessCollector::with_root(root.path(), users());

    let capped = collector.snapshot(3).unwrap();
    assert_eq!(capped.len(), 3);
    assert!(capped.is_truncated());

    let exact = collector.snapshot(5).unwrap();
    assert_eq!(exact.len(), 5);
    assert!(!exact.is_truncated());
}

#[test]
fn test_missing_registry_is_an_error() {
    let root = TempDir::new().unwrap();
    let collector = LinuxProcessCollector::with_root(root.path().join("gone"), users());
    assert!(matches!(
        collector.snapshot(16),
        Err(CollectError::Registry { .. })
    ));
}
