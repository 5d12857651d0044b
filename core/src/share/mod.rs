//! Remote share client capability traits.
//!
//! The wire protocol lives outside this crate. A backend provides a
//! [`ShareConnector`] that opens a connection to one share and returns a
//! [`ShareClient`] handle for listing and reading. The session owns that
//! handle; transfers borrow it through a cloned `Arc`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ShareError;

/// Username and password presented to the server.
///
/// An empty username means guest access.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn is_guest(&self) -> bool {
        self.username.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Kind of a raw directory entry as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Directory,
    File,
    /// Symlinks, devices and anything else the server reports.
    Other,
}

/// One entry as returned by [`ShareClient::list_directory`], before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    /// Full slash-delimited path relative to the share root.
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Optional features a share client supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCapabilities {
    /// Whether [`ShareClient::read_chunk`] is implemented.
    pub chunked_read: bool,
}

/// Opens connections to remote shares.
#[async_trait::async_trait]
pub trait ShareConnector: Send + Sync {
    /// Connect to `address` with `credential` and mount `share`.
    ///
    /// Returns a connected client. Authentication failures, unknown shares
    /// and network errors are all reported as `Err`.
    async fn connect(
        &self,
        address: &Url,
        credential: &Credential,
        share: &str,
    ) -> Result<Arc<dyn ShareClient>, ShareError>;
}

/// A connected handle to one mounted share.
#[async_trait::async_trait]
pub trait ShareClient: Send + Sync {
    fn capabilities(&self) -> ShareCapabilities {
        ShareCapabilities::default()
    }

    /// List the raw entries of the directory at `path`.
    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, ShareError>;

    /// Read a whole file into memory.
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, ShareError>;

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Returns an empty buffer at end of file. Only called when
    /// [`ShareCapabilities::chunked_read`] is `true`.
    async fn read_chunk(
        &self,
        _path: &str,
        _offset: u64,
        _len: usize,
    ) -> Result<Vec<u8>, ShareError> {
        Err(ShareError::NotSupported)
    }

    /// Unmount the share and release the connection.
    async fn disconnect(&self) -> Result<(), ShareError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ShareClient, _: &dyn ShareConnector) {}
    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn share_traits_are_send_sync() {
        _assert_send_sync::<Arc<dyn ShareClient>>();
        _assert_send_sync::<Arc<dyn ShareConnector>>();
    }

    #[test]
    fn credential_debug_hides_password() {
        let credential = Credential {
            username: "bob".into(),
            password: "a&b".into(),
        };
        let debug = format!("{credential:?}");
        assert!(debug.contains("bob"));
        assert!(!debug.contains("a&b"));
    }

    #[test]
    fn capabilities_default_to_whole_file_reads() {
        assert!(!ShareCapabilities::default().chunked_read);
    }

    struct WholeFileOnly;

    #[async_trait::async_trait]
    impl ShareClient for WholeFileOnly {
        async fn list_directory(&self, _path: &str) -> Result<Vec<RawEntry>, ShareError> {
            Ok(Vec::new())
        }

        async fn read_file(&self, _path: &str) -> Result<Vec<u8>, ShareError> {
            Ok(b"data".to_vec())
        }

        async fn disconnect(&self) -> Result<(), ShareError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn read_chunk_defaults_to_not_supported() {
        let client = WholeFileOnly;
        let err = client.read_chunk("/a", 0, 16).await.unwrap_err();
        assert!(matches!(err, ShareError::NotSupported));
    }
}
