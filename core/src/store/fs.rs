use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::LocalStore;
use crate::errors::StoreError;
use crate::transfer::scratch::ScratchFile;

/// Timestamp appended to a file name that is already taken.
const COLLISION_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Saves downloads into a directory on the local filesystem.
///
/// When the suggested name already exists, a `_yyyyMMdd_HHmmss` suffix is
/// inserted before the extension; a numeric counter follows if that name
/// is taken as well.
///
/// The copy runs on the blocking pool. If the `save` future is dropped
/// before it resolves, the file is either never moved into place or
/// removed again, so an abandoned save leaves nothing behind.
#[derive(Debug, Clone)]
pub struct FsLocalStore {
    root: PathBuf,
}

impl FsLocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl LocalStore for FsLocalStore {
    async fn save(&self, source: &Path, suggested_name: &str) -> Result<PathBuf, StoreError> {
        let name = sanitize_file_name(suggested_name)?;
        let root = self.root.clone();
        let source = source.to_path_buf();

        let guard = CommitGuard::new();
        let commit = guard.commit.clone();
        let destination =
            tokio::task::spawn_blocking(move || save_blocking(&root, &source, &name, &commit))
                .await
                .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        guard.deliver();

        info!(destination = %destination.display(), "Saved download");
        Ok(destination)
    }
}

/// Progress of one save, shared between the async caller and the blocking copy.
#[derive(Debug)]
enum Commit {
    Pending,
    Abandoned,
    Committed(PathBuf),
    Delivered,
}

fn lock(commit: &Mutex<Commit>) -> MutexGuard<'_, Commit> {
    commit.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held by the `save` future. Dropping it before [`deliver`](Self::deliver)
/// abandons the save and removes a file that was already moved into place.
struct CommitGuard {
    commit: Arc<Mutex<Commit>>,
}

impl CommitGuard {
    fn new() -> Self {
        Self {
            commit: Arc::new(Mutex::new(Commit::Pending)),
        }
    }

    fn deliver(self) {
        *lock(&self.commit) = Commit::Delivered;
    }
}

impl Drop for CommitGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.commit);
        match std::mem::replace(&mut *state, Commit::Abandoned) {
            Commit::Committed(path) => match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed abandoned download"),
                Err(e) => warn!(path = %path.display(), "Failed to remove abandoned download: {e}"),
            },
            Commit::Delivered => *state = Commit::Delivered,
            Commit::Pending | Commit::Abandoned => {}
        }
    }
}

/// Copy `source` under a hidden name, then move it into place unless the
/// caller has abandoned the save.
fn save_blocking(
    root: &Path,
    source: &Path,
    name: &str,
    commit: &Mutex<Commit>,
) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(root)?;

    // A truncated copy never appears under the final name.
    let partial_name = format!(".{name}.{}.partial", Uuid::new_v4().simple());
    let partial = ScratchFile::guard(root.join(partial_name));
    std::fs::copy(source, partial.path())?;

    let mut state = lock(commit);
    if matches!(*state, Commit::Abandoned) {
        return Err(StoreError::Abandoned);
    }
    let destination = destination_for(root, name)?;
    std::fs::rename(partial.path(), &destination)?;
    partial.keep();
    *state = Commit::Committed(destination.clone());
    Ok(destination)
}

/// Destination path for `name` under `root`, avoiding existing files.
fn destination_for(root: &Path, name: &str) -> Result<PathBuf, StoreError> {
    let candidate = root.join(name);
    if !candidate.try_exists()? {
        return Ok(candidate);
    }

    let (stem, extension) = split_extension(name);
    let timestamp = Local::now().format(COLLISION_SUFFIX_FORMAT).to_string();
    let mut counter = 0u32;
    loop {
        let suffix = if counter == 0 {
            timestamp.clone()
        } else {
            format!("{timestamp}_{counter}")
        };
        let renamed = match extension {
            Some(ext) => format!("{stem}_{suffix}.{ext}"),
            None => format!("{stem}_{suffix}"),
        };
        let candidate = root.join(&renamed);
        if !candidate.try_exists()? {
            debug!(original = name, renamed = %renamed, "Destination exists, renaming");
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Reduce a suggested name to its final path component.
pub fn sanitize_file_name(suggested: &str) -> Result<String, StoreError> {
    let name = suggested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StoreError::InvalidName(suggested.to_string()));
    }
    Ok(name.to_string())
}

/// Split `name` into stem and extension. Leading-dot names have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}
