//! Writer behavior with and without a configured lock manager.

use projector::adapters::{FileLockManager, LockManager};
use projector::policy::Policy;
use projector::{ErrorKind, WriteOutcome};

use crate::common::{entries, payload, read_visible, writer_with};

#[test]
fn required_lock_without_manager_fails_closed() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let (w, facts) = writer_with(root, Policy::locked());

    let err = w.write(&payload(&[("a", "1", 0o644)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Locking);
    assert!(entries(root).is_empty());
    assert_eq!(facts.of("write.result")[0].1["error_kind"], "Locking");
}

#[test]
fn file_lock_is_taken_per_write_and_lives_in_reserved_namespace() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let (w, facts) = writer_with(root, Policy::locked());
    let w = w.with_lock_manager(Box::new(FileLockManager::for_target(root)));

    let p = payload(&[("a", "1", 0o644)]);
    assert!(w.write(&p).unwrap().is_updated());
    assert_eq!(w.write(&p).unwrap(), WriteOutcome::Unchanged);

    assert!(root.join("..lock").is_file());
    assert_eq!(read_visible(root, "a").0, "1");
    let attempts = facts.of("write.attempt");
    assert_eq!(attempts[0].1["lock_backend"], "file");
}

#[test]
fn contended_lock_times_out() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let mut policy = Policy::locked();
    policy.governance.lock_timeout_ms = 50;
    let (w, _facts) = writer_with(root, policy);
    let w = w.with_lock_manager(Box::new(FileLockManager::for_target(root)));

    let held = FileLockManager::for_target(root)
        .acquire_process_lock(1_000)
        .unwrap();
    let err = w.write(&payload(&[("a", "1", 0o644)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Locking);
    assert_eq!(entries(root), vec!["..lock".to_string()]);

    drop(held);
    assert!(w.write(&payload(&[("a", "1", 0o644)])).unwrap().is_updated());
}
