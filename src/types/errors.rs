//! Error types used across the projector.
use thiserror::Error;

/// High-level error categories surfaced by `AtomicWriter`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A payload key failed validation. Nothing was written.
    #[error("invalid path")]
    InvalidPath,
    /// The target directory does not exist.
    #[error("not found")]
    NotFound,
    /// A filesystem call failed before the swap. The previous version is still current.
    #[error("io error")]
    Io,
    /// The configured lock manager did not grant the lock in time. Nothing was written.
    #[error("locking")]
    Locking,
    /// The swap succeeded, but pruning stale entries or old snapshots failed.
    #[error("cleanup incomplete")]
    Cleanup,
}

/// Structured error with a kind and human message.
#[derive(Debug, Error)]
#[error("{kind:?}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
        }
    }

    pub(crate) fn io(context: &str, err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("{context}: {err}"))
    }

    pub(crate) fn invalid_path(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPath, msg)
    }

    /// True when the new version became current despite this error.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self.kind, ErrorKind::Cleanup)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}

/// Convenient alias for results returning a `types::Error`.
pub type Result<T> = std::result::Result<T, Error>;
