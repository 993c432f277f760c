//! Permission bits on disk match the payload regardless of the process umask.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use rustix::fs::Mode;
use rustix::process::umask;
use serial_test::serial;

use crate::common::{data_link, payload, read_visible, writer};

fn mode_of(p: &std::path::Path) -> u32 {
    fs::metadata(p).unwrap().permissions().mode() & 0o7777
}

#[test]
#[serial]
fn restrictive_umask_does_not_narrow_modes() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);

    let prev = umask(Mode::from_bits_truncate(0o077));
    let result = w.write(&payload(&[
        ("public", "p", 0o644),
        ("script", "s", 0o755),
        ("nested/shared", "n", 0o664),
    ]));
    umask(prev);
    result.unwrap();

    assert_eq!(read_visible(root, "public").1, 0o644);
    assert_eq!(read_visible(root, "script").1, 0o755);
    assert_eq!(read_visible(root, "nested/shared").1, 0o664);

    let snap = root.join(data_link(root).unwrap());
    assert_eq!(mode_of(&snap), 0o755);
}

#[test]
fn private_mode_is_kept() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);

    w.write(&payload(&[("secret", "k", 0o600)])).unwrap();
    assert_eq!(read_visible(root, "secret"), ("k".to_string(), 0o600));
}

#[test]
fn type_bits_in_mode_are_ignored() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);

    w.write(&payload(&[("f", "x", 0o100_640)])).unwrap();
    assert_eq!(read_visible(root, "f").1, 0o640);

    // Same permission bits without the type bits is not a change.
    let outcome = w.write(&payload(&[("f", "x", 0o640)])).unwrap();
    assert!(!outcome.is_updated());
}

#[test]
fn unreadable_file_is_replaced_with_same_length_content() {
    let td = tempfile::tempdir().unwrap();
    let root = td.path();
    let w = writer(root);

    w.write(&payload(&[("secret", "aaaa", 0o000)])).unwrap();
    let first = data_link(root).unwrap();

    let outcome = w.write(&payload(&[("secret", "bbbb", 0o000)])).unwrap();
    assert!(outcome.is_updated());
    assert_ne!(data_link(root).unwrap(), first);

    let snap = root.join(data_link(root).unwrap());
    assert_eq!(mode_of(&snap.join("secret")), 0o000);
    assert_eq!(fs::metadata(snap.join("secret")).unwrap().len(), 4);
}
