//! Writes a validated payload into a snapshot directory.
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write as _};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use crate::constants::INTERMEDIATE_DIR_MODE;
use crate::types::{CleanPayload, FileProjection, ProjectedPath};

/// Write every payload entry beneath `dir`, which must already exist.
///
/// Stops at the first failing entry. Entries already written are left in
/// place; the caller discards the whole directory.
pub fn write_payload_to_dir(payload: &CleanPayload, dir: &Path, fsync: bool) -> io::Result<()> {
    for (path, projection) in payload.iter() {
        write_projection(dir, path, projection, fsync).map_err(|e| {
            log::error!("unable to write {path} (mode {:o}): {e}", projection.permissions());
            e
        })?;
    }
    Ok(())
}

fn write_projection(
    dir: &Path,
    path: &ProjectedPath,
    projection: &FileProjection,
    fsync: bool,
) -> io::Result<()> {
    let full = dir.join(path.as_path());
    if let Some(parent) = full.parent() {
        DirBuilder::new()
            .recursive(true)
            .mode(INTERMEDIATE_DIR_MODE)
            .create(parent)?;
    }

    let mode = projection.permissions();
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(&full)?;
    file.write_all(&projection.data)?;
    // The creation mode above was filtered through the umask.
    file.set_permissions(fs::Permissions::from_mode(mode))?;
    if fsync {
        file.sync_all()?;
    }
    Ok(())
}
