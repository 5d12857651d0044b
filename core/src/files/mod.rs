//! Directory entries, listing and path navigation for a mounted share.

pub mod listing;
pub mod path;
pub mod utils;

pub use listing::{list_directory, Listing};
pub use path::{breadcrumbs, into_directory, to_breadcrumb_segment, up, Breadcrumb, BrowsePath};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::share::{EntryKind, RawEntry};

/// A file or directory shown in a listing.
///
/// `id` is generated per listing call so UI lists can diff rows without
/// relying on the path. Field names are serialized as camelCase for the
/// frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    /// Always 0 for directories.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl DirectoryEntry {
    /// Map a raw server entry listed under `parent`.
    ///
    /// Servers that omit the full path get one composed from `parent` and
    /// the entry name.
    pub fn from_raw(raw: RawEntry, parent: &BrowsePath) -> Self {
        let is_directory = raw.kind == EntryKind::Directory;
        let path = if raw.path.is_empty() {
            parent.join(&raw.name)
        } else {
            BrowsePath::parse(&raw.path)
        };
        Self {
            id: Uuid::new_v4(),
            name: raw.name,
            path: path.to_string(),
            is_directory,
            size: if is_directory { 0 } else { raw.size },
            modified: raw.modified,
        }
    }

    /// Human-readable size column text.
    pub fn formatted_size(&self) -> String {
        if self.is_directory {
            return "Folder".to_string();
        }
        utils::format_size(self.size)
    }
}
