use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::{LOCK_FILE_NAME, LOCK_POLL_MS};
use crate::types::errors::{Error, ErrorKind, Result};
use fs2::FileExt;

use super::{LockGuard, LockManager};

/// Advisory `flock` on a lock file shared by every writer of one target.
///
/// The lock file is created on first use and never removed; its content is
/// irrelevant.
#[derive(Debug)]
pub struct FileLockManager {
    path: PathBuf,
}

impl FileLockManager {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Lock file at `<target>/..lock`, inside the writer's reserved namespace.
    #[must_use]
    pub fn for_target(target: &Path) -> Self {
        Self::new(target.join(LOCK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(&format!("open lock file {}", self.path.display()), &e))
    }
}

/// Holds the flock until dropped.
struct HeldLock {
    file: File,
    path: PathBuf,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("unable to release lock {}: {e}", self.path.display());
        }
    }
}

impl LockGuard for HeldLock {}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl LockManager for FileLockManager {
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>> {
        let file = self.open()?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(Box::new(HeldLock {
                        file,
                        path: self.path.clone(),
                    }))
                }
                Err(e) if !is_contended(&e) => {
                    return Err(Error::io(&format!("lock {}", self.path.display()), &e));
                }
                Err(_) if Instant::now() >= deadline => {
                    return Err(Error::new(
                        ErrorKind::Locking,
                        format!(
                            "lock {} still held after {timeout_ms}ms",
                            self.path.display()
                        ),
                    ));
                }
                Err(_) => thread::sleep(Duration::from_millis(LOCK_POLL_MS)),
            }
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
