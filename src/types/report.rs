/// Result of a successful `AtomicWriter::write`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The payload already matched the current snapshot; nothing was touched.
    Unchanged,
    /// A new snapshot became current.
    Updated {
        /// Name of the new snapshot directory inside the target directory.
        snapshot: String,
        /// Top-level visible entries pruned because their segment left the payload.
        removed: Vec<String>,
    },
}

impl WriteOutcome {
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, WriteOutcome::Updated { .. })
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            WriteOutcome::Unchanged => None,
            WriteOutcome::Updated { snapshot, .. } => Some(snapshot),
        }
    }
}
