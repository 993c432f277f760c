//! Directory-handle primitives for the data symlink swap.
//!
//! Every mutation of the reserved link names goes through an `O_DIRECTORY |
//! O_NOFOLLOW` handle on the target directory and the `*at` syscalls, so the
//! names are resolved against the same directory for the whole swap.
use std::path::Path;

use rustix::fd::OwnedFd;
use rustix::fs::{openat, readlinkat, renameat, symlinkat, unlinkat, AtFlags, Mode, OFlags, CWD};
use rustix::io::Errno;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

/// Open a directory with `O_DIRECTORY` | `O_NOFOLLOW`.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be opened.
pub fn open_dir_nofollow(dir: &Path) -> std::io::Result<OwnedFd> {
    openat(
        CWD,
        dir,
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::empty(),
    )
    .map_err(errno_to_io)
}

/// Fsync a directory through an already-open handle.
pub fn fsync_dirfd(dirfd: &OwnedFd) -> std::io::Result<()> {
    rustix::fs::fsync(dirfd).map_err(errno_to_io)
}

/// Create `name` inside `dirfd` as a symlink to `link_target`.
pub fn symlink_at(dirfd: &OwnedFd, link_target: &str, name: &str) -> std::io::Result<()> {
    symlinkat(link_target, dirfd, name).map_err(errno_to_io)
}

/// Rename `from` over `to` within the same directory.
pub fn rename_at(dirfd: &OwnedFd, from: &str, to: &str) -> std::io::Result<()> {
    renameat(dirfd, from, dirfd, to).map_err(errno_to_io)
}

/// Unlink `name`, treating absence as success. Returns whether an entry was removed.
pub fn unlink_if_present(dirfd: &OwnedFd, name: &str) -> std::io::Result<bool> {
    match unlinkat(dirfd, name, AtFlags::empty()) {
        Ok(()) => Ok(true),
        Err(e) if e == Errno::NOENT => Ok(false),
        Err(e) => Err(errno_to_io(e)),
    }
}

/// Read the target of symlink `name`. `Ok(None)` when the entry does not exist.
pub fn read_link_at(dirfd: &OwnedFd, name: &str) -> std::io::Result<Option<String>> {
    match readlinkat(dirfd, name, Vec::new()) {
        Ok(target) => target.into_string().map(Some).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "link target is not UTF-8")
        }),
        Err(e) if e == Errno::NOENT => Ok(None),
        Err(e) => Err(errno_to_io(e)),
    }
}
