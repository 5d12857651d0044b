//! Path navigation over slash-delimited share paths.
//!
//! Paths are held as a list of segments, so `"/"`, `""` and `"//"` all
//! denote the root and no function here ever produces a doubled or
//! trailing slash. Everything in this module is pure: no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SessionError;
use crate::files::DirectoryEntry;

/// Label of the synthetic first breadcrumb.
pub const ROOT_LABEL: &str = "root";

/// A normalized absolute path inside a share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BrowsePath {
    segments: Vec<String>,
}

impl BrowsePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-delimited path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` at the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path with the last segment removed; the root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// Append one child segment. Slashes inside `name` are treated as separators.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(name.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        Self { segments }
    }

    /// The first `len` segments of this path.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }
}

impl fmt::Display for BrowsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<String> for BrowsePath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&str> for BrowsePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<BrowsePath> for String {
    fn from(path: BrowsePath) -> Self {
        path.to_string()
    }
}

/// One clickable segment of a breadcrumb bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: BrowsePath,
}

/// Target path for opening a directory entry.
pub fn into_directory(entry: &DirectoryEntry) -> Result<BrowsePath, SessionError> {
    if !entry.is_directory {
        return Err(SessionError::NotADirectory(entry.path.clone()));
    }
    Ok(BrowsePath::parse(&entry.path))
}

/// Parent of `current`. Idempotent at the root.
pub fn up(current: &BrowsePath) -> BrowsePath {
    current.parent()
}

/// Path selected by clicking breadcrumb `index` (0 is the synthetic root).
///
/// Returns `None` for an index past the last segment.
pub fn to_breadcrumb_segment(current: &BrowsePath, index: usize) -> Option<BrowsePath> {
    if index > current.segments().len() {
        return None;
    }
    Some(current.prefix(index))
}

/// Breadcrumbs for `current`, starting with the root.
pub fn breadcrumbs(current: &BrowsePath) -> Vec<Breadcrumb> {
    let mut crumbs = vec![Breadcrumb {
        label: ROOT_LABEL.to_string(),
        path: BrowsePath::root(),
    }];
    crumbs.extend(
        current
            .segments()
            .iter()
            .enumerate()
            .map(|(i, segment)| Breadcrumb {
                label: segment.clone(),
                path: current.prefix(i + 1),
            }),
    );
    crumbs
}
