//! Failures before the swap leave the previous version authoritative.

use std::fs;
use std::io;

use rustix::fd::OwnedFd;

use projector::fs::atomic::rename_at;
use projector::fs::SwapStrategy;
use projector::ErrorKind;

use crate::common::{data_link, payload, read_visible, snapshot_dirs, writer, writer_with};
use projector::policy::Policy;

#[derive(Debug)]
struct FailingSwap;

impl SwapStrategy for FailingSwap {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn is_atomic(&self) -> bool {
        true
    }

    fn commit(&self, _dirfd: &OwnedFd, _snapshot: &str, _previous: Option<&str>) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "injected swap failure"))
    }
}

/// Flips `..data` and then reports an error, as a strategy failing in its own cleanup would.
#[derive(Debug)]
struct FailsAfterFlip;

impl SwapStrategy for FailsAfterFlip {
    fn name(&self) -> &'static str {
        "fails-after-flip"
    }

    fn is_atomic(&self) -> bool {
        true
    }

    fn commit(&self, dirfd: &OwnedFd, _snapshot: &str, _previous: Option<&str>) -> io::Result<()> {
        rename_at(dirfd, "..data_tmp", "..data")?;
        Err(io::Error::new(io::ErrorKind::Other, "injected failure after flip"))
    }
}

#[test]
fn swap_error_after_flip_keeps_new_snapshot_current() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);
    w.write(&payload(&[("a", "old", 0o644)])).unwrap();
    let old = data_link(root).unwrap();

    let w = w.with_swap_strategy(Box::new(FailsAfterFlip));
    let err = w.write(&payload(&[("a", "new", 0o644)])).unwrap_err();

    assert_eq!(err.kind, ErrorKind::Cleanup);
    assert!(err.is_committed());
    let current = data_link(root).unwrap();
    assert_ne!(current, old);
    assert_eq!(snapshot_dirs(root), vec![current]);
    assert_eq!(read_visible(root, "a").0, "new");
    assert!(fs::symlink_metadata(root.join("..data_tmp")).is_err());
}

#[test]
fn swap_failure_rolls_back_new_snapshot_and_staged_link() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);
    w.write(&payload(&[("a", "old", 0o644)])).unwrap();
    let before = snapshot_dirs(root);

    let w = w.with_swap_strategy(Box::new(FailingSwap));
    let err = w.write(&payload(&[("a", "new", 0o644)])).unwrap_err();

    assert_eq!(err.kind, ErrorKind::Io);
    assert!(!err.is_committed());
    assert_eq!(snapshot_dirs(root), before);
    assert_eq!(data_link(root), Some(before[0].clone()));
    assert!(fs::symlink_metadata(root.join("..data_tmp")).is_err());
    assert_eq!(read_visible(root, "a").0, "old");
}

#[test]
fn materialize_failure_discards_partial_snapshot() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let (w, facts) = writer_with(root, Policy::default());
    w.write(&payload(&[("keep", "v1", 0o644)])).unwrap();
    let before = snapshot_dirs(root);

    // "x" as a file and "x/y" beneath it cannot both be materialized.
    let err = w
        .write(&payload(&[("keep", "v2", 0o644), ("x", "file", 0o644), ("x/y", "nested", 0o644)]))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Io);
    assert_eq!(snapshot_dirs(root), before);
    assert_eq!(read_visible(root, "keep").0, "v1");
    assert!(fs::symlink_metadata(root.join("x")).is_err());

    let results = facts.of("write.result");
    let (decision, fields) = results.last().unwrap();
    assert_eq!(decision, "failure");
    assert_eq!(fields["error_kind"], "Io");
}

#[test]
fn first_write_failure_leaves_no_data_link() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root).with_swap_strategy(Box::new(FailingSwap));

    assert!(w.write(&payload(&[("a", "1", 0o644)])).is_err());
    assert_eq!(data_link(root), None);
    assert!(snapshot_dirs(root).is_empty());
    assert_eq!(w.current_snapshot().unwrap(), None);
}

#[test]
fn unreadable_data_link_is_fatal() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    // A regular file where the data link should be.
    fs::write(root.join("..data"), b"not a link").unwrap();
    let w = writer(root);

    let err = w.write(&payload(&[("a", "1", 0o644)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
    assert!(snapshot_dirs(root).is_empty());
    assert!(fs::symlink_metadata(root.join("a")).is_err());
}
