use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOCK_TIMEOUT_MS;

/// How `..data` is repointed at a new snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapMode {
    /// Probe the target directory once at construction.
    #[default]
    Auto,
    /// Single `renameat` of `..data_tmp` over `..data`.
    Rename,
    /// Unlink and recreate `..data`; readers may briefly see it missing.
    Recreate,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockingPolicy {
    /// Refuse to write when no lock manager is configured.
    Required,
    /// Write unlocked when no lock manager is configured; the caller serializes.
    #[default]
    Optional,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Durability {
    /// fsync projected files and the target directory after the swap.
    pub fsync: bool,
}

impl Default for Durability {
    fn default() -> Self {
        Self { fsync: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cleanup {
    /// Remove snapshot directories left behind by interrupted writes.
    pub prune_orphans: bool,
}

impl Default for Cleanup {
    fn default() -> Self {
        Self {
            prune_orphans: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Governance {
    pub locking: LockingPolicy,
    pub lock_timeout_ms: u64,
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            locking: LockingPolicy::Optional,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}
