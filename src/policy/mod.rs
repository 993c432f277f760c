//! Writer configuration.
//!
//! Consumers construct a [`Policy`](crate::policy::Policy) (usually via
//! `Default` or `Policy::from_json`) and hand it to
//! [`AtomicWriter::with_sinks`](crate::AtomicWriter::with_sinks).
//!
//! Submodules:
//! - `config`: the policy struct, defaults and loading
//! - `types`: grouped knobs

pub mod config;
pub mod types;

pub use config::Policy;
pub use types::*;
