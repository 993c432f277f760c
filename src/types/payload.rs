use std::collections::{BTreeMap, BTreeSet};

use super::errors::Result;
use super::path::ProjectedPath;

/// Desired content and permission bits of one projected file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileProjection {
    pub data: Vec<u8>,
    pub mode: u32,
}

impl FileProjection {
    pub fn new(data: impl Into<Vec<u8>>, mode: u32) -> Self {
        Self {
            data: data.into(),
            mode,
        }
    }

    /// Permission bits actually applied on disk (type bits stripped).
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Caller-supplied mapping from logical relative path to projected file.
///
/// Ordered so that normalization collisions resolve deterministically: the
/// lexicographically last original key wins.
pub type Payload = BTreeMap<String, FileProjection>;

/// A payload whose keys have all passed validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanPayload {
    entries: BTreeMap<ProjectedPath, FileProjection>,
}

impl CleanPayload {
    /// Validates every key of `payload`, failing on the first invalid one.
    pub fn validate(payload: &Payload) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, projection) in payload {
            let path = ProjectedPath::parse(key)?;
            if entries.insert(path, projection.clone()).is_some() {
                log::debug!("payload key {key:?} overrides an earlier key with the same normalized path");
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectedPath, &FileProjection)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct first segments across all keys.
    pub fn top_level_names(&self) -> BTreeSet<&str> {
        self.entries.keys().map(ProjectedPath::top_level).collect()
    }

    /// Every key together with all of its ancestor directories.
    pub fn referenced_paths(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .flat_map(ProjectedPath::with_ancestors)
            .map(str::to_owned)
            .collect()
    }
}
