use serde::{Deserialize, Serialize};

use super::types::{Cleanup, Durability, Governance, LockingPolicy, SwapMode};

/// Policy governs how an `AtomicWriter` swaps, syncs, locks and cleans up.
///
/// Every field has a default, so a partial JSON document is a valid policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub swap: SwapMode,
    pub durability: Durability,
    pub cleanup: Cleanup,
    pub governance: Governance,
}

impl Policy {
    /// Parse a policy from JSON; missing fields take their defaults.
    ///
    /// # Example
    /// ```rust
    /// use projector::policy::{Policy, SwapMode};
    ///
    /// let policy = Policy::from_json(r#"{"swap": "recreate", "durability": {"fsync": false}}"#).unwrap();
    /// assert_eq!(policy.swap, SwapMode::Recreate);
    /// assert!(!policy.durability.fsync);
    /// assert!(policy.cleanup.prune_orphans);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input or unknown enum values.
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Defaults plus a mandatory lock manager.
    #[must_use]
    pub fn locked() -> Self {
        let mut p = Self::default();
        p.governance.locking = LockingPolicy::Required;
        p
    }
}
