//! Compares a payload against the current snapshot directory.
//!
//! Both checks are read-only. Change detection stops at the first differing
//! entry; the removal set is `on_disk - referenced`, where `referenced` is
//! every key plus all of its ancestor directories, so a directory still
//! holding a surviving key is never scheduled for removal.
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use rustix::io::Errno;

use crate::types::{CleanPayload, FileProjection};

/// What a write against an existing snapshot must do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Some entry differs from, or is missing in, the current snapshot.
    pub write_required: bool,
    /// Relative paths present in the current snapshot but no longer referenced.
    pub paths_to_remove: BTreeSet<String>,
}

impl SnapshotDiff {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.write_required && self.paths_to_remove.is_empty()
    }

    /// Members of the removal set that name a visible entry at the target root.
    pub fn top_level_removals(&self) -> impl Iterator<Item = &str> {
        self.paths_to_remove
            .iter()
            .map(String::as_str)
            .filter(|p| !p.contains('/'))
    }
}

/// Diff `payload` against the snapshot rooted at `old_dir`.
pub fn diff_snapshot(payload: &CleanPayload, old_dir: &Path) -> io::Result<SnapshotDiff> {
    let paths_to_remove = paths_to_remove(payload, old_dir)?;
    let write_required = should_write_payload(payload, old_dir)?;
    Ok(SnapshotDiff {
        write_required,
        paths_to_remove,
    })
}

/// Whether any entry of `payload` differs from its counterpart under `old_dir`.
pub fn should_write_payload(payload: &CleanPayload, old_dir: &Path) -> io::Result<bool> {
    for (path, projection) in payload.iter() {
        if should_write_file(&old_dir.join(path.as_path()), projection)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn should_write_file(path: &Path, projection: &FileProjection) -> io::Result<bool> {
    let md = match fs::symlink_metadata(path) {
        Ok(md) => md,
        Err(e) if is_absent(&e) => return Ok(true),
        Err(e) => return Err(e),
    };
    if !md.file_type().is_file() {
        return Ok(true);
    }
    if md.permissions().mode() & 0o7777 != projection.permissions() {
        return Ok(true);
    }
    if md.len() != projection.data.len() as u64 {
        return Ok(true);
    }
    contents_differ(fs::read(path), &projection.data)
}

// Old content the writer may not read (e.g. mode 0o000) is replaced, not compared.
fn contents_differ(current: io::Result<Vec<u8>>, wanted: &[u8]) -> io::Result<bool> {
    match current {
        Ok(bytes) => Ok(bytes != wanted),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(true),
        Err(e) => Err(e),
    }
}

// A parent that is now a file reports ENOTDIR rather than ENOENT.
fn is_absent(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(Errno::NOTDIR.raw_os_error())
}

/// Relative paths under `old_dir` that `payload` no longer references.
///
/// A missing `old_dir` yields an empty set.
pub fn paths_to_remove(payload: &CleanPayload, old_dir: &Path) -> io::Result<BTreeSet<String>> {
    let mut on_disk = BTreeSet::new();
    match collect_entries(old_dir, "", &mut on_disk) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound && on_disk.is_empty() => {
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(e),
    }
    let referenced = payload.referenced_paths();
    let result: BTreeSet<String> = on_disk.difference(&referenced).cloned().collect();
    if !result.is_empty() {
        log::debug!("paths to remove under {}: {result:?}", old_dir.display());
    }
    Ok(result)
}

fn collect_entries(dir: &Path, prefix: &str, out: &mut BTreeSet<String>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let fname = entry.file_name();
        // The materializer only creates UTF-8 names.
        let Some(name) = fname.to_str() else { continue };
        let rel = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        if entry.file_type()?.is_dir() {
            collect_entries(&entry.path(), &rel, out)?;
        }
        out.insert(rel);
    }
    Ok(())
}
