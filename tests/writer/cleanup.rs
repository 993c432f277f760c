//! Failures after the swap are reported but the new version stays current.

use std::fs;

use projector::ErrorKind;

use crate::common::{data_link, payload, read_visible, snapshot_dirs, writer_with};
use projector::policy::Policy;

#[test]
fn stale_entry_that_cannot_be_pruned_reports_cleanup() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let (w, facts) = writer_with(root, Policy::default());

    w.write(&payload(&[("a", "1", 0o644), ("c", "2", 0o644)])).unwrap();

    // Someone replaced the visible link with a non-empty directory.
    fs::remove_file(root.join("c")).unwrap();
    fs::create_dir(root.join("c")).unwrap();
    fs::write(root.join("c/theirs"), b"x").unwrap();

    let err = w.write(&payload(&[("a", "3", 0o644)])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cleanup);
    assert!(err.is_committed());

    assert_eq!(read_visible(root, "a").0, "3");
    let snaps = snapshot_dirs(root);
    assert_eq!(snaps.len(), 1, "old snapshot is still removed: {snaps:?}");
    assert_eq!(data_link(root), Some(snaps[0].clone()));
    assert!(root.join("c/theirs").exists());

    let results = facts.of("write.result");
    let (decision, fields) = results.last().unwrap();
    assert_eq!(decision, "warn");
    assert_eq!(fields["error_kind"], "Cleanup");
}
