//! External synchronization for writers sharing a target directory.
//!
//! The writer never locks on its own. A `LockManager` configured on the
//! writer is held for the whole of each `write` call.
pub mod file;

use crate::types::errors::Result;

/// Releases the lock when dropped.
pub trait LockGuard: Send {}

pub trait LockManager: Send + Sync {
    /// Acquire the lock, waiting at most `timeout_ms`.
    /// # Errors
    /// Returns a `Locking` error if the lock is not granted in time.
    fn acquire_process_lock(&self, timeout_ms: u64) -> Result<Box<dyn LockGuard>>;

    /// Label used in facts.
    fn backend(&self) -> &'static str {
        "custom"
    }
}
