//! Shared crate-wide constants for the projector.
//!
//! Every name the writer manages inside a target directory starts with `..`;
//! callers cannot supply payload keys in that namespace.

/// Reserved prefix for all bookkeeping entries in the target directory.
pub const RESERVED_PREFIX: &str = "..";

/// Symlink whose target names the current snapshot directory.
pub const DATA_DIR_NAME: &str = "..data";

/// Transient symlink staged next to `..data` and renamed over it during a swap.
pub const NEW_DATA_DIR_NAME: &str = "..data_tmp";

/// Lock file name used by `FileLockManager::for_target`.
pub const LOCK_FILE_NAME: &str = "..lock";

/// Names used once by swap capability detection; absent in steady state.
pub const SWAP_PROBE_NAME: &str = "..swap_probe";
pub const SWAP_PROBE_TMP_NAME: &str = "..swap_probe_tmp";

/// Maximum byte length of a payload key.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Maximum byte length of a single payload key segment.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Snapshot directories must be traversable by readers running as other users.
pub const SNAPSHOT_DIR_MODE: u32 = 0o755;

/// Mode for intermediate directories inside a snapshot. Access is governed by
/// the mode of the files themselves.
pub const INTERMEDIATE_DIR_MODE: u32 = 0o777;

/// Length of the unique suffix appended to snapshot directory names.
pub const SNAPSHOT_SUFFIX_LEN: usize = 10;

/// Attempts at allocating an unused snapshot directory name before giving up.
pub const SNAPSHOT_CREATE_ATTEMPTS: usize = 16;

/// Poll interval in milliseconds for the file-backed lock manager.
pub const LOCK_POLL_MS: u64 = 25;

/// Default bound on waiting for the optional lock manager.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Subsystem label attached to every emitted fact.
pub const SUBSYSTEM: &str = "projector";
