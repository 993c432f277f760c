use std::fmt;
use std::path::Path;

use crate::constants::{MAX_FILE_NAME_LENGTH, MAX_PATH_LENGTH, RESERVED_PREFIX};

use super::errors::{Error, Result};

/// A validated, normalized payload key.
///
/// Always relative, `/`-separated, free of empty, `.` and `..` segments, and
/// never inside the reserved `..` namespace at its first segment.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectedPath {
    rel: String,
}

impl ProjectedPath {
    /// Validates a caller-supplied key and returns its normalized form.
    ///
    /// Rejections, in order: empty; absolute; longer than `MAX_PATH_LENGTH`
    /// bytes; a segment longer than `MAX_FILE_NAME_LENGTH` bytes; a `..`
    /// segment; nothing left after normalization; a first segment starting
    /// with `..`.
    pub fn parse(candidate: &str) -> Result<Self> {
        if candidate.is_empty() {
            return Err(Error::invalid_path("invalid path: must not be empty"));
        }
        if candidate.starts_with('/') {
            return Err(Error::invalid_path(format!(
                "invalid path: must be relative path: {candidate}"
            )));
        }
        if candidate.len() > MAX_PATH_LENGTH {
            return Err(Error::invalid_path(format!(
                "invalid path: must be less than or equal to {MAX_PATH_LENGTH} characters"
            )));
        }

        let items: Vec<&str> = candidate.split('/').collect();
        if items.iter().any(|item| item.len() > MAX_FILE_NAME_LENGTH) {
            return Err(Error::invalid_path(format!(
                "invalid path: filenames must be less than or equal to {MAX_FILE_NAME_LENGTH} characters"
            )));
        }
        if items.iter().any(|item| *item == "..") {
            return Err(Error::invalid_path(format!(
                "invalid path: must not contain '..': {candidate}"
            )));
        }

        let segments: Vec<&str> = items
            .into_iter()
            .filter(|item| !item.is_empty() && *item != ".")
            .collect();
        let Some(first) = segments.first() else {
            return Err(Error::invalid_path(format!(
                "invalid path: must name a file: {candidate}"
            )));
        };
        if first.starts_with(RESERVED_PREFIX) && first.len() > RESERVED_PREFIX.len() {
            return Err(Error::invalid_path(format!(
                "invalid path: must not start with '..': {candidate}"
            )));
        }

        Ok(Self {
            rel: segments.join("/"),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.rel
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.rel)
    }

    /// First segment; the name of the visible entry this key is reached through.
    pub fn top_level(&self) -> &str {
        match self.rel.find('/') {
            Some(idx) => &self.rel[..idx],
            None => &self.rel,
        }
    }

    /// The path itself followed by each of its ancestor directories, deepest first.
    pub fn with_ancestors(&self) -> impl Iterator<Item = &str> {
        let rel = self.rel.as_str();
        std::iter::once(rel).chain(rel.rmatch_indices('/').map(move |(idx, _)| &rel[..idx]))
    }
}

impl fmt::Display for ProjectedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel)
    }
}
