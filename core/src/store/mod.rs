//! Local persistence of finished downloads.
//!
//! The transfer coordinator writes into a scratch file and then hands that
//! file to a [`LocalStore`], which picks the final destination and resolves
//! name collisions. The store never sees transfer state.

pub mod fs;

pub use fs::FsLocalStore;

use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// Destination for downloaded files.
#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    /// Persist the file at `source` under a name derived from `suggested_name`.
    ///
    /// `source` is owned by the caller and removed after this returns; the
    /// store must copy or move it. Returns the final destination path.
    async fn save(&self, source: &Path, suggested_name: &str) -> Result<PathBuf, StoreError>;
}
