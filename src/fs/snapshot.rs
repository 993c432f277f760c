//! Snapshot directory allocation, removal and orphan pruning.
//!
//! A snapshot directory is named `..YYYY_MM_DD_HH_MM_SS.<suffix>` (UTC) and
//! holds one complete materialized payload. It is never modified after the
//! swap that makes it current.
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::{
    RESERVED_PREFIX, SNAPSHOT_CREATE_ATTEMPTS, SNAPSHOT_DIR_MODE, SNAPSHOT_SUFFIX_LEN,
};

const STAMP_LEN: usize = "YYYY_MM_DD_HH_MM_SS".len();

/// A freshly allocated snapshot directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotDir {
    /// Entry name inside the target directory; what `..data` points to.
    pub name: String,
    pub path: PathBuf,
}

/// Format a snapshot directory name for `now` with the given suffix.
pub fn snapshot_dir_name(now: OffsetDateTime, suffix: &str) -> String {
    let stamp = now
        .format(format_description!(
            "[year]_[month]_[day]_[hour]_[minute]_[second]"
        ))
        .unwrap_or_else(|_| "0000_00_00_00_00_00".to_string());
    format!("{RESERVED_PREFIX}{stamp}.{suffix}")
}

/// Whether `name` has the shape produced by `snapshot_dir_name`.
pub fn is_snapshot_dir_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(RESERVED_PREFIX) else {
        return false;
    };
    let Some((stamp, suffix)) = rest.split_once('.') else {
        return false;
    };
    !suffix.is_empty()
        && stamp.len() == STAMP_LEN
        && stamp.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 | 10 | 13 | 16 => b == b'_',
            _ => b.is_ascii_digit(),
        })
}

fn unique_suffix() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(SNAPSHOT_SUFFIX_LEN);
    s
}

/// Create a new, uniquely named snapshot directory inside `target` with mode 0755.
///
/// The mode is set explicitly after creation so the process umask cannot
/// narrow it.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be created or chmodded.
pub fn create_snapshot_dir(target: &Path) -> io::Result<SnapshotDir> {
    for _ in 0..SNAPSHOT_CREATE_ATTEMPTS {
        let name = snapshot_dir_name(OffsetDateTime::now_utc(), &unique_suffix());
        let path = target.join(&name);
        match fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
        if let Err(e) = fs::set_permissions(&path, fs::Permissions::from_mode(SNAPSHOT_DIR_MODE)) {
            let _ = fs::remove_dir(&path);
            return Err(e);
        }
        return Ok(SnapshotDir { name, path });
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "unable to allocate a unique snapshot directory name",
    ))
}

/// Recursively remove a snapshot directory. Absence is not an error.
pub fn remove_snapshot_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Names of snapshot directories in `target` other than `current`.
pub fn list_orphan_snapshots(target: &Path, current: &str) -> io::Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(target)? {
        let entry = entry?;
        let fname = entry.file_name();
        let Some(name) = fname.to_str() else { continue };
        if name == current || !is_snapshot_dir_name(name) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            out.push(name.to_string());
        }
    }
    out.sort_unstable();
    Ok(out)
}

/// Remove every snapshot directory in `target` except `current`.
///
/// Deletions are best-effort: a failure does not stop the remaining ones and
/// the last error is returned. On success returns the number pruned.
pub fn prune_orphan_snapshots(target: &Path, current: &str) -> io::Result<usize> {
    let mut pruned = 0usize;
    let mut last_err = None;
    for name in list_orphan_snapshots(target, current)? {
        match remove_snapshot_dir(&target.join(&name)) {
            Ok(()) => pruned += 1,
            Err(e) => {
                log::error!("unable to prune orphaned snapshot directory {name}: {e}");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => Ok(pruned),
    }
}
