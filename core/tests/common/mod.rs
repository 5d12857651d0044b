//! Shared test utilities for sharecast core integration tests.
//!
//! Provides a gated in-memory share and a gated store whose calls block
//! until released, and helpers for building on-disk share fixtures.

// Each integration test is compiled as its own crate, so not every test file
// uses every function from this shared module. Suppress dead_code warnings.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sharecast_core::errors::{ShareError, StoreError};
use sharecast_core::share::{Credential, EntryKind, RawEntry, ShareClient, ShareConnector};
use sharecast_core::store::LocalStore;
use tokio::sync::Notify;
use url::Url;

/// Size of the single file served by [`GatedShare`].
pub const FILE_SIZE: usize = 1000;

/// Name of the single file served by [`GatedShare`].
pub const FILE_NAME: &str = "f.mkv";

/// Shared control surface for the gated share.
#[derive(Default)]
pub struct Gate {
    /// Ordered log of read events (`read-N-start`, `read-N-dropped`, `read-N-done`).
    pub events: Mutex<Vec<String>>,
    /// Signalled each time a read starts.
    pub started: Notify,
    /// Wakes one blocked read.
    pub release: Notify,
    /// When set, reads do not block at all.
    pub open: AtomicBool,
    reads: AtomicUsize,
}

impl Gate {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

/// Records `read-N-dropped` if the read future is dropped before finishing.
struct ReadGuard {
    gate: Arc<Gate>,
    id: usize,
    finished: bool,
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        let outcome = if self.finished { "done" } else { "dropped" };
        self.gate.record(format!("read-{}-{outcome}", self.id));
    }
}

/// A connector serving one directory with a single [`FILE_SIZE`]-byte file.
pub struct GatedShare {
    pub gate: Arc<Gate>,
}

impl GatedShare {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Gate::default()),
        }
    }
}

#[async_trait::async_trait]
impl ShareConnector for GatedShare {
    async fn connect(
        &self,
        _address: &Url,
        _credential: &Credential,
        _share: &str,
    ) -> Result<Arc<dyn ShareClient>, ShareError> {
        Ok(Arc::new(GatedClient {
            gate: self.gate.clone(),
        }))
    }
}

pub struct GatedClient {
    pub gate: Arc<Gate>,
}

#[async_trait::async_trait]
impl ShareClient for GatedClient {
    async fn list_directory(&self, _path: &str) -> Result<Vec<RawEntry>, ShareError> {
        Ok(vec![RawEntry {
            name: FILE_NAME.to_string(),
            path: format!("/{FILE_NAME}"),
            kind: EntryKind::File,
            size: FILE_SIZE as u64,
            modified: None,
        }])
    }

    async fn read_file(&self, _path: &str) -> Result<Vec<u8>, ShareError> {
        let id = self.gate.reads.fetch_add(1, Ordering::SeqCst) + 1;
        self.gate.record(format!("read-{id}-start"));
        let mut guard = ReadGuard {
            gate: self.gate.clone(),
            id,
            finished: false,
        };
        self.gate.started.notify_one();

        if !self.gate.open.load(Ordering::SeqCst) {
            self.gate.release.notified().await;
        }

        guard.finished = true;
        Ok(vec![0xAB; FILE_SIZE])
    }

    async fn disconnect(&self) -> Result<(), ShareError> {
        Ok(())
    }
}

/// A store whose `save` blocks until released, then writes into `root`.
pub struct GatedStore {
    pub root: PathBuf,
    /// Signalled when `save` is entered.
    pub entered: Notify,
    /// Lets one blocked `save` proceed.
    pub release: Notify,
    /// Scratch files present when `save` was entered.
    pub scratch_seen: Mutex<Vec<PathBuf>>,
}

impl GatedStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entered: Notify::new(),
            release: Notify::new(),
            scratch_seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LocalStore for GatedStore {
    async fn save(&self, source: &Path, suggested_name: &str) -> Result<PathBuf, StoreError> {
        if source.exists() {
            self.scratch_seen.lock().unwrap().push(source.to_path_buf());
        }
        self.entered.notify_one();
        self.release.notified().await;

        let destination = self.root.join(suggested_name);
        tokio::fs::copy(source, &destination).await?;
        Ok(destination)
    }
}

/// True when `dir` is missing or has no entries.
pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

/// Build `<root>/media` with two directories, two files and a hidden entry.
pub fn media_share(root: &Path) {
    let media = root.join("media");
    std::fs::create_dir_all(media.join("Movies").join("Action")).unwrap();
    std::fs::create_dir_all(media.join("Series")).unwrap();
    std::fs::create_dir_all(media.join(".snapshots")).unwrap();
    std::fs::write(media.join("readme.txt"), b"hello").unwrap();
    std::fs::write(media.join("Intro.mp4"), vec![1u8; 2048]).unwrap();
    std::fs::write(media.join("Movies").join("f.mkv"), vec![7u8; 1000]).unwrap();
}
