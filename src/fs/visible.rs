//! Top-level symlinks through which consumers read projected content.
//!
//! Each distinct first segment `name` of the payload gets
//! `<target>/name -> ..data/name`. The link never names a snapshot directly,
//! so it keeps working across swaps without being touched.
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::os::unix::fs as unix_fs;
use std::path::Path;

use crate::constants::DATA_DIR_NAME;
use crate::types::CleanPayload;

/// Create missing visible links for every top-level segment of `payload`.
///
/// Any existing entry with the same name is left alone. Returns the names
/// that were created.
pub fn create_visible_links(payload: &CleanPayload, target: &Path) -> io::Result<Vec<String>> {
    let mut created = Vec::new();
    for name in payload.top_level_names() {
        let visible = target.join(name);
        match fs::symlink_metadata(&visible) {
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        unix_fs::symlink(Path::new(DATA_DIR_NAME).join(name), &visible)?;
        created.push(name.to_string());
    }
    Ok(created)
}

/// Remove the top-level members of `paths` from `target`.
///
/// Nested paths are skipped: they only ever existed inside a snapshot.
/// Every candidate is attempted; the last failure is returned.
pub fn remove_visible_paths(paths: &BTreeSet<String>, target: &Path) -> io::Result<()> {
    let mut last_err = None;
    for p in paths.iter().filter(|p| !p.contains('/')) {
        match fs::remove_file(target.join(p)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                log::error!("unable to prune old user-visible path {p}: {e}");
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
