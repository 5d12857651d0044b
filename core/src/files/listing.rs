use std::cmp::Ordering;

use tracing::debug;

use super::{BrowsePath, DirectoryEntry};
use crate::errors::SessionError;
use crate::share::ShareClient;

/// Whether an entry name may appear in a listing.
///
/// `.` and `..` are always hidden, as is anything starting with `hidden_marker`.
pub fn is_visible(name: &str, hidden_marker: &str) -> bool {
    !(name.is_empty() || name == "." || name == ".." || name.starts_with(hidden_marker))
}

/// Directories first, then case-sensitive ascending name.
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.cmp(&b.name))
}

/// Fetch, filter, map and sort the entries of `path`.
///
/// The whole result is built before returning; a fetch error yields no
/// partial listing.
pub async fn list_directory(
    client: &dyn ShareClient,
    path: &BrowsePath,
    hidden_marker: &str,
) -> Result<Vec<DirectoryEntry>, SessionError> {
    let raw = client
        .list_directory(&path.to_string())
        .await
        .map_err(|e| SessionError::ListFailed(e.to_string()))?;

    let total = raw.len();
    let mut entries: Vec<DirectoryEntry> = raw
        .into_iter()
        .filter(|entry| is_visible(&entry.name, hidden_marker))
        .map(|entry| DirectoryEntry::from_raw(entry, path))
        .collect();
    entries.sort_by(compare_entries);

    debug!(
        path = %path,
        total,
        visible = entries.len(),
        "Listed directory"
    );
    Ok(entries)
}

/// The most recent successful listing.
///
/// Replaced wholesale on success; left untouched when a refresh fails so
/// the UI keeps showing stale-but-valid rows.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    path: BrowsePath,
    entries: Vec<DirectoryEntry>,
}

impl Listing {
    pub fn path(&self) -> &BrowsePath {
        &self.path
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn replace(&mut self, path: BrowsePath, entries: Vec<DirectoryEntry>) {
        self.path = path;
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.path = BrowsePath::root();
        self.entries.clear();
    }

    /// Find an entry of the current listing by its id.
    pub fn find(&self, id: &uuid::Uuid) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.id == *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShareError;
    use crate::share::{EntryKind, RawEntry};
    use std::sync::Mutex;

    /// Returns a fixed set of raw entries and records requested paths.
    struct FixedClient {
        entries: Vec<RawEntry>,
        requested: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FixedClient {
        fn new(entries: Vec<RawEntry>) -> Self {
            Self {
                entries,
                requested: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl ShareClient for FixedClient {
        async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, ShareError> {
            self.requested.lock().unwrap().push(path.to_string());
            if self.fail {
                return Err(ShareError::OperationFailed("connection reset".into()));
            }
            Ok(self.entries.clone())
        }

        async fn read_file(&self, _path: &str) -> Result<Vec<u8>, ShareError> {
            Err(ShareError::NotSupported)
        }

        async fn disconnect(&self) -> Result<(), ShareError> {
            Ok(())
        }
    }

    fn raw(name: &str, kind: EntryKind) -> RawEntry {
        RawEntry {
            name: name.to_string(),
            path: format!("/Movies/{name}"),
            kind,
            size: 10,
            modified: None,
        }
    }

    #[test]
    fn visibility_rules() {
        assert!(!is_visible(".", "."));
        assert!(!is_visible("..", "."));
        assert!(!is_visible(".DS_Store", "."));
        assert!(!is_visible("", "."));
        assert!(is_visible("movie.mkv", "."));
        assert!(is_visible(".keep", "_"));
        assert!(!is_visible("_sync", "_"));
        assert!(!is_visible("..", "_"), "dot entries are hidden for any marker");
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let client = FixedClient::new(vec![
            raw("b.mkv", EntryKind::File),
            raw(".hidden", EntryKind::File),
            raw("Zeta", EntryKind::Directory),
            raw(".", EntryKind::Directory),
            raw("a.srt", EntryKind::File),
            raw("..", EntryKind::Directory),
            raw("Alpha", EntryKind::Directory),
            raw("B.mkv", EntryKind::File),
            raw(".Trash", EntryKind::Directory),
        ]);

        let entries = list_directory(&client, &BrowsePath::parse("/Movies"), ".")
            .await
            .unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta", "B.mkv", "a.srt", "b.mkv"]);
        assert_eq!(*client.requested.lock().unwrap(), vec!["/Movies".to_string()]);
    }

    #[tokio::test]
    async fn list_order_invariant_holds_for_adjacent_pairs() {
        let client = FixedClient::new(vec![
            raw("m", EntryKind::File),
            raw("M", EntryKind::Directory),
            raw("a", EntryKind::Other),
            raw("z", EntryKind::Directory),
            raw("A", EntryKind::File),
            raw("_", EntryKind::File),
        ]);
        let entries = list_directory(&client, &BrowsePath::root(), ".")
            .await
            .unwrap();
        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.is_directory >= b.is_directory);
            if a.is_directory == b.is_directory {
                assert!(a.name <= b.name, "{} should sort before {}", a.name, b.name);
            }
        }
    }

    #[tokio::test]
    async fn list_failure_maps_to_list_failed() {
        let mut client = FixedClient::new(vec![raw("a", EntryKind::File)]);
        client.fail = true;
        let err = list_directory(&client, &BrowsePath::root(), ".")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ListFailed(ref m) if m.contains("connection reset")));
    }

    #[test]
    fn listing_replace_and_clear() {
        let mut listing = Listing::default();
        assert!(listing.path().is_root());
        assert!(listing.entries().is_empty());

        let entry = DirectoryEntry::from_raw(raw("a", EntryKind::File), &BrowsePath::root());
        let id = entry.id;
        listing.replace(BrowsePath::parse("/Movies"), vec![entry]);
        assert_eq!(listing.path().to_string(), "/Movies");
        assert_eq!(listing.find(&id).map(|e| e.name.as_str()), Some("a"));

        listing.clear();
        assert!(listing.path().is_root());
        assert!(listing.find(&id).is_none());
    }
}
