// Facade for the writer; the write algorithm lives in `write.rs`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::adapters::LockManager;
use crate::constants::{DATA_DIR_NAME, RESERVED_PREFIX};
use crate::fs::atomic::{open_dir_nofollow, read_link_at};
use crate::fs::swap::{self, SwapStrategy};
use crate::logging::{AuditSink, FactsEmitter, LogSink};
use crate::policy::Policy;
use crate::types::{Error, ErrorKind, Payload, Result, WriteOutcome};

mod write;

/// Atomically projects payloads into one target directory.
///
/// Consumers read `<target>/<name>`, which resolves through `<target>/..data`
/// into the current snapshot directory. A `write` either leaves the previous
/// snapshot current or makes a complete new one current with one swap of
/// `..data`.
///
/// The writer keeps no lock of its own: at most one `write` may run against
/// a target directory at a time. Configure a [`LockManager`] to have the
/// writer hold one across each call.
pub struct AtomicWriter<E: FactsEmitter = LogSink, A: AuditSink = LogSink> {
    target_dir: PathBuf,
    facts: E,
    audit: A,
    policy: Policy,
    swap: Box<dyn SwapStrategy>,
    lock: Option<Box<dyn LockManager>>,
}

impl AtomicWriter {
    /// Writer for an existing `target_dir` with default policy, logging through `log`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `target_dir` does not exist or is not a directory.
    pub fn new(target_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_sinks(target_dir, LogSink, LogSink, Policy::default())
    }
}

impl<E: FactsEmitter, A: AuditSink> AtomicWriter<E, A> {
    /// Writer with explicit fact/audit sinks and policy.
    ///
    /// The target path is canonicalized. With `SwapMode::Auto` the swap
    /// strategy is chosen here by probing the directory.
    ///
    /// # Errors
    ///
    /// `NotFound` if `target_dir` does not exist or is not a directory.
    pub fn with_sinks(
        target_dir: impl AsRef<Path>,
        facts: E,
        audit: A,
        policy: Policy,
    ) -> Result<Self> {
        let requested = target_dir.as_ref();
        let target_dir = match fs::canonicalize(requested) {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("target directory does not exist: {}", requested.display()),
                ));
            }
            Err(e) => return Err(Error::io("resolve target directory", &e)),
        };
        if !target_dir.is_dir() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("target is not a directory: {}", target_dir.display()),
            ));
        }
        let swap = swap::select(policy.swap, &target_dir);
        Ok(Self {
            target_dir,
            facts,
            audit,
            policy,
            swap,
            lock: None,
        })
    }

    #[must_use]
    pub fn with_lock_manager(mut self, lock: Box<dyn LockManager>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Replace the strategy chosen from the policy.
    #[must_use]
    pub fn with_swap_strategy(mut self, swap: Box<dyn SwapStrategy>) -> Self {
        self.swap = swap;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn swap_strategy(&self) -> &dyn SwapStrategy {
        self.swap.as_ref()
    }

    /// Name of the snapshot directory `..data` currently points to.
    ///
    /// # Errors
    ///
    /// `Io` if `..data` exists but cannot be read, or points outside the
    /// target directory's reserved namespace.
    pub fn current_snapshot(&self) -> Result<Option<String>> {
        let dirfd = open_dir_nofollow(&self.target_dir)
            .map_err(|e| Error::io("open target directory", &e))?;
        let link = read_link_at(&dirfd, DATA_DIR_NAME)
            .map_err(|e| Error::io("unable to read link for data directory", &e))?;
        match link {
            Some(name) if !is_snapshot_link_target(&name) => Err(Error::new(
                ErrorKind::Io,
                format!("data directory link points outside the target directory: {name}"),
            )),
            other => Ok(other),
        }
    }

    /// Atomically project `payload` into the target directory.
    ///
    /// Returns `Unchanged` without touching the disk when the payload already
    /// matches the current snapshot. An error of kind `Cleanup` means the new
    /// version is current but stale entries or directories were left behind;
    /// the next successful write prunes them.
    ///
    /// # Errors
    ///
    /// `InvalidPath`, `Locking` and `Io` leave the previous version current.
    pub fn write(&self, payload: &Payload) -> Result<WriteOutcome> {
        write::run(self, payload)
    }
}

fn is_snapshot_link_target(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX) && name.len() > RESERVED_PREFIX.len() && !name.contains('/')
}
