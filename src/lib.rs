#![forbid(unsafe_code)]
//! Projector: atomic projection of in-memory files into a directory.
//!
//! Layout managed inside a target directory:
//! - `..data` is a symlink to the current snapshot directory.
//! - `..YYYY_MM_DD_HH_MM_SS.<suffix>/` are snapshot directories holding one
//!   complete version each.
//! - `<name>` is a symlink to `..data/<name>` for every top-level payload name.
//!
//! Readers going through `<name>` or `..data` see either the complete old
//! version or the complete new one: the only reader-visible mutation of a
//! write is one `renameat` of `..data_tmp` over `..data`.
//!
//! Callers must serialize writes to one target directory, either themselves
//! or by configuring a [`LockManager`](crate::adapters::LockManager).
//!
//! This crate forbids `unsafe` and uses `rustix` for the `*at` syscalls.
//!
//! ```rust
//! use projector::{AtomicWriter, FileProjection, Payload};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let writer = AtomicWriter::new(dir.path()).unwrap();
//! let mut payload = Payload::new();
//! payload.insert("config/app.toml".into(), FileProjection::new("level = 1\n", 0o644));
//! writer.write(&payload).unwrap();
//! assert_eq!(
//!     std::fs::read_to_string(dir.path().join("config/app.toml")).unwrap(),
//!     "level = 1\n"
//! );
//! ```

pub mod adapters;
pub mod api;
pub mod constants;
pub mod fs;
pub mod logging;
pub mod policy;
pub mod types;

pub use api::*;
pub use types::{Error, ErrorKind, FileProjection, Payload, Result, WriteOutcome};
