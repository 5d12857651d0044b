use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;
use url::Url;

use crate::errors::ShareError;
use crate::share::{
    Credential, EntryKind, RawEntry, ShareCapabilities, ShareClient, ShareConnector,
};

/// Serves directories under `root` as shares.
///
/// Share `media` maps to `<root>/media`. The server address is ignored.
/// When a credential is required, connections presenting a different one
/// are rejected.
#[derive(Debug, Clone)]
pub struct LocalShareConnector {
    root: PathBuf,
    required: Option<Credential>,
}

impl LocalShareConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            required: None,
        }
    }

    pub fn with_required_credential(mut self, credential: Credential) -> Self {
        self.required = Some(credential);
        self
    }
}

#[async_trait::async_trait]
impl ShareConnector for LocalShareConnector {
    async fn connect(
        &self,
        address: &Url,
        credential: &Credential,
        share: &str,
    ) -> Result<Arc<dyn ShareClient>, ShareError> {
        if let Some(required) = &self.required {
            if required != credential {
                return Err(ShareError::AuthenticationFailed(format!(
                    "user '{}' rejected",
                    credential.username
                )));
            }
        }

        if share.is_empty() || share.contains(['/', '\\']) || share == ".." {
            return Err(ShareError::ShareNotFound(share.to_string()));
        }
        let share_root = self.root.join(share);
        let metadata = tokio::fs::metadata(&share_root)
            .await
            .map_err(|_| ShareError::ShareNotFound(share.to_string()))?;
        if !metadata.is_dir() {
            return Err(ShareError::ShareNotFound(share.to_string()));
        }

        debug!(
            host = address.host_str().unwrap_or_default(),
            share,
            root = %share_root.display(),
            "Mounted local share"
        );
        Ok(Arc::new(LocalShareClient::new(share_root)))
    }
}

/// A mounted local share.
#[derive(Debug)]
pub struct LocalShareClient {
    root: PathBuf,
    closed: AtomicBool,
}

impl LocalShareClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            closed: AtomicBool::new(false),
        }
    }

    /// Map a share path onto the filesystem, refusing to leave the share.
    fn resolve(&self, path: &str) -> Result<PathBuf, ShareError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ShareError::OperationFailed("share disconnected".into()));
        }
        let mut resolved = self.root.clone();
        for segment in path.split(['/', '\\']).filter(|s| !s.is_empty() && *s != ".") {
            if segment == ".." {
                return Err(ShareError::NotFound(path.to_string()));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

fn map_io(path: &str, err: std::io::Error) -> ShareError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ShareError::NotFound(path.to_string())
    } else {
        ShareError::Io(err)
    }
}

fn entry_kind(metadata: &std::fs::Metadata) -> EntryKind {
    if metadata.is_dir() {
        EntryKind::Directory
    } else if metadata.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

fn share_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        format!("/{name}")
    } else if parent.starts_with('/') {
        format!("{parent}/{name}")
    } else {
        format!("/{parent}/{name}")
    }
}

#[async_trait::async_trait]
impl ShareClient for LocalShareClient {
    fn capabilities(&self) -> ShareCapabilities {
        ShareCapabilities { chunked_read: true }
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RawEntry>, ShareError> {
        let dir = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| map_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let metadata = entry.metadata().await?;
            entries.push(RawEntry {
                path: share_path(path, &name),
                kind: entry_kind(&metadata),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                name,
            });
        }
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, ShareError> {
        let file = self.resolve(path)?;
        ensure_file(&file, path).await?;
        tokio::fs::read(&file).await.map_err(|e| map_io(path, e))
    }

    async fn read_chunk(
        &self,
        path: &str,
        offset: u64,
        len: usize,
    ) -> Result<Vec<u8>, ShareError> {
        let file_path = self.resolve(path)?;
        ensure_file(&file_path, path).await?;
        let mut file = tokio::fs::File::open(&file_path)
            .await
            .map_err(|e| map_io(path, e))?;
        file.seek(std::io::SeekFrom::Start(offset)).await?;

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    async fn disconnect(&self) -> Result<(), ShareError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

async fn ensure_file(file: &Path, path: &str) -> Result<(), ShareError> {
    let metadata = tokio::fs::metadata(file).await.map_err(|e| map_io(path, e))?;
    if !metadata.is_file() {
        return Err(ShareError::OperationFailed(format!("{path} is not a file")));
    }
    Ok(())
}
