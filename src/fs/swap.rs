//! Strategies for pointing `..data` at a new snapshot.
//!
//! The orchestrator stages `..data_tmp -> <snapshot>` first; a strategy then
//! makes `..data` resolve to the same snapshot. `RenameSwap` does this with
//! one `renameat`, which is the single visibility flip for every reader.
//! `RecreateSwap` unlinks and recreates `..data`, leaving a short window
//! where the link is absent; it exists for filesystems that refuse to rename
//! over a symlink.
use std::fmt;
use std::path::Path;

use rustix::fd::OwnedFd;

use crate::constants::{DATA_DIR_NAME, NEW_DATA_DIR_NAME, SWAP_PROBE_NAME, SWAP_PROBE_TMP_NAME};
use crate::policy::SwapMode;

use super::atomic::{open_dir_nofollow, read_link_at, rename_at, symlink_at, unlink_if_present};

/// Makes the staged snapshot current.
pub trait SwapStrategy: Send + Sync + fmt::Debug {
    /// Stable label used in facts.
    fn name(&self) -> &'static str;

    /// Whether readers can never observe `..data` missing during `commit`.
    fn is_atomic(&self) -> bool;

    /// Point `..data` at `snapshot`, with `..data_tmp` already staged to it.
    ///
    /// On success `..data_tmp` no longer exists. `previous` is the snapshot
    /// `..data` named before the call, if any.
    fn commit(&self, dirfd: &OwnedFd, snapshot: &str, previous: Option<&str>) -> std::io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RenameSwap;

impl SwapStrategy for RenameSwap {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn is_atomic(&self) -> bool {
        true
    }

    fn commit(&self, dirfd: &OwnedFd, _snapshot: &str, _previous: Option<&str>) -> std::io::Result<()> {
        rename_at(dirfd, NEW_DATA_DIR_NAME, DATA_DIR_NAME)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RecreateSwap;

impl SwapStrategy for RecreateSwap {
    fn name(&self) -> &'static str {
        "recreate"
    }

    fn is_atomic(&self) -> bool {
        false
    }

    fn commit(&self, dirfd: &OwnedFd, snapshot: &str, previous: Option<&str>) -> std::io::Result<()> {
        unlink_if_present(dirfd, DATA_DIR_NAME)?;
        if let Err(e) = symlink_at(dirfd, snapshot, DATA_DIR_NAME) {
            // Put the previous link back so the old version stays readable.
            if let Some(prev) = previous {
                let _ = symlink_at(dirfd, prev, DATA_DIR_NAME);
            }
            return Err(e);
        }
        // `..data` already names the new snapshot; the next write unlinks a leftover tmp link.
        if let Err(e) = unlink_if_present(dirfd, NEW_DATA_DIR_NAME) {
            log::warn!("unable to remove {NEW_DATA_DIR_NAME} after swap: {e}");
        }
        Ok(())
    }
}

/// Resolve a configured mode to a strategy, probing `target` for `Auto`.
pub fn select(mode: SwapMode, target: &Path) -> Box<dyn SwapStrategy> {
    match mode {
        SwapMode::Rename => Box::new(RenameSwap),
        SwapMode::Recreate => Box::new(RecreateSwap),
        SwapMode::Auto => detect(target),
    }
}

/// Probe whether `target` supports renaming one symlink over another.
///
/// Uses two reserved names that are removed again before returning. Any
/// failure during the probe selects `RecreateSwap`.
pub fn detect(target: &Path) -> Box<dyn SwapStrategy> {
    match probe_rename_over_symlink(target) {
        Ok(true) => Box::new(RenameSwap),
        Ok(false) => {
            log::warn!(
                "rename over symlink not honored in {}; using non-atomic swap",
                target.display()
            );
            Box::new(RecreateSwap)
        }
        Err(e) => {
            log::warn!(
                "swap capability probe failed in {}: {e}; using non-atomic swap",
                target.display()
            );
            Box::new(RecreateSwap)
        }
    }
}

fn probe_rename_over_symlink(target: &Path) -> std::io::Result<bool> {
    let dirfd = open_dir_nofollow(target)?;
    unlink_if_present(&dirfd, SWAP_PROBE_NAME)?;
    unlink_if_present(&dirfd, SWAP_PROBE_TMP_NAME)?;

    let outcome = symlink_at(&dirfd, "old", SWAP_PROBE_NAME)
        .and_then(|()| symlink_at(&dirfd, "new", SWAP_PROBE_TMP_NAME))
        .and_then(|()| rename_at(&dirfd, SWAP_PROBE_TMP_NAME, SWAP_PROBE_NAME))
        .and_then(|()| read_link_at(&dirfd, SWAP_PROBE_NAME));

    let _ = unlink_if_present(&dirfd, SWAP_PROBE_NAME);
    let _ = unlink_if_present(&dirfd, SWAP_PROBE_TMP_NAME);

    outcome.map(|link| link.as_deref() == Some("new"))
}
