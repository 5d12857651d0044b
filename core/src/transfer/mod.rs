//! Cancellable, progress-reporting downloads from a mounted share.
//!
//! The [`TransferCoordinator`] owns at most one in-flight transfer. Each
//! transfer runs as a tokio task with its own [`CancellationToken`],
//! publishes progress on a `watch` channel and reports exactly one
//! [`TransferOutcome`] through a `oneshot` channel.
//!
//! Sequence per transfer:
//!
//! 1. allocate a scratch file (stale copies removed)
//! 2. checkpoint
//! 3. read remote bytes (chunked when the client supports it)
//! 4. checkpoint
//! 5. write bytes to the scratch file
//! 6. checkpoint
//! 7. publish 100% progress
//! 8. hand the scratch file to the [`LocalStore`]
//! 9. remove the scratch file (on every exit path)
//!
//! Every suspension point also races the cancellation token, so a cancel
//! unwinds without waiting for a slow read to finish.

pub mod scratch;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BrowserSettings;
use crate::errors::TransferError;
use crate::files::DirectoryEntry;
use crate::share::ShareClient;
use crate::store::fs::sanitize_file_name;
use crate::store::LocalStore;

use self::scratch::ScratchFile;

/// Lifecycle state of one transfer. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Succeeded | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }
}

/// Point-in-time view of a transfer, published on its progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSnapshot {
    pub id: Uuid,
    pub name: String,
    pub remote_path: String,
    pub total_bytes: u64,
    pub bytes_completed: u64,
    pub status: TransferStatus,
    pub last_error: Option<String>,
}

impl TransferSnapshot {
    /// Completed fraction in `0.0..=1.0`; 0 when the size is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return if self.status == TransferStatus::Succeeded { 1.0 } else { 0.0 };
        }
        (self.bytes_completed as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Terminal result of a transfer.
#[derive(Debug)]
pub enum TransferOutcome {
    Succeeded { saved_to: PathBuf, bytes: u64 },
    Failed(TransferError),
    Cancelled,
}

impl TransferOutcome {
    pub fn status(&self) -> TransferStatus {
        match self {
            TransferOutcome::Succeeded { .. } => TransferStatus::Succeeded,
            TransferOutcome::Failed(_) => TransferStatus::Failed,
            TransferOutcome::Cancelled => TransferStatus::Cancelled,
        }
    }
}

/// Caller-side handle to a started transfer.
#[derive(Debug)]
pub struct TransferHandle {
    id: Uuid,
    progress: watch::Receiver<TransferSnapshot>,
    outcome: oneshot::Receiver<TransferOutcome>,
}

impl TransferHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to progress updates.
    pub fn progress(&self) -> watch::Receiver<TransferSnapshot> {
        self.progress.clone()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TransferSnapshot {
        self.progress.borrow().clone()
    }

    /// Wait for the terminal outcome.
    ///
    /// A task that vanished without reporting (aborted runtime) counts as
    /// cancelled.
    pub async fn outcome(self) -> TransferOutcome {
        self.outcome.await.unwrap_or(TransferOutcome::Cancelled)
    }
}

/// Everything the transfer task needs, moved into it on spawn.
struct TransferJob {
    id: Uuid,
    name: String,
    remote_path: String,
    scratch_dir: PathBuf,
    chunk_size: usize,
    client: Arc<dyn ShareClient>,
    store: Arc<dyn LocalStore>,
}

struct ActiveTransfer {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    progress: watch::Receiver<TransferSnapshot>,
}

impl ActiveTransfer {
    fn is_running(&self) -> bool {
        self.progress.borrow().status == TransferStatus::Running
    }
}

/// Owns the single in-flight download.
pub struct TransferCoordinator {
    scratch_dir: PathBuf,
    chunk_size: usize,
    active: Option<ActiveTransfer>,
}

impl TransferCoordinator {
    pub fn new(scratch_dir: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            chunk_size: chunk_size.max(1),
            active: None,
        }
    }

    pub fn from_settings(settings: &BrowserSettings) -> Self {
        Self::new(settings.scratch_dir(), settings.chunk_size)
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveTransfer::is_running)
    }

    /// Snapshot of the current or most recently finished transfer.
    ///
    /// `None` when idle or after a cancellation reset.
    pub fn current(&self) -> Option<TransferSnapshot> {
        self.active.as_ref().map(|a| a.progress.borrow().clone())
    }

    /// Start downloading `entry` through `client` into `store`.
    ///
    /// A running transfer is cancelled first, and its task is awaited so
    /// its cleanup completes before the new transfer touches the disk.
    pub async fn start(
        &mut self,
        client: Arc<dyn ShareClient>,
        entry: &DirectoryEntry,
        store: Arc<dyn LocalStore>,
    ) -> Result<TransferHandle, TransferError> {
        if entry.is_directory {
            return Err(TransferError::RemoteReadFailed(format!(
                "{} is a directory",
                entry.path
            )));
        }

        self.cancel().await;
        self.active = None;

        let id = Uuid::new_v4();
        let snapshot = TransferSnapshot {
            id,
            name: entry.name.clone(),
            remote_path: entry.path.clone(),
            total_bytes: entry.size,
            bytes_completed: 0,
            status: TransferStatus::Running,
            last_error: None,
        };
        let (progress_tx, progress_rx) = watch::channel(snapshot);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let job = TransferJob {
            id,
            name: entry.name.clone(),
            remote_path: entry.path.clone(),
            scratch_dir: self.scratch_dir.clone(),
            chunk_size: self.chunk_size,
            client,
            store,
        };

        info!(
            transfer = %id,
            path = %entry.path,
            size = entry.size,
            "Starting transfer"
        );
        let task = tokio::spawn(run_transfer(job, progress_tx, outcome_tx, cancel.clone()));

        self.active = Some(ActiveTransfer {
            id,
            cancel,
            task,
            progress: progress_rx.clone(),
        });

        Ok(TransferHandle {
            id,
            progress: progress_rx,
            outcome: outcome_rx,
        })
    }

    /// Cancel the running transfer and wait for it to unwind.
    ///
    /// No-op when nothing is running. Afterwards the coordinator is idle.
    pub async fn cancel(&mut self) {
        let running = self.active.as_ref().is_some_and(ActiveTransfer::is_running);
        if !running {
            return;
        }
        if let Some(active) = self.active.take() {
            debug!(transfer = %active.id, "Cancelling transfer");
            active.cancel.cancel();
            if let Err(e) = active.task.await {
                warn!(transfer = %active.id, "Transfer task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for TransferCoordinator {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

async fn run_transfer(
    job: TransferJob,
    progress: watch::Sender<TransferSnapshot>,
    outcome_tx: oneshot::Sender<TransferOutcome>,
    cancel: CancellationToken,
) {
    let result = execute(&job, &progress, &cancel).await;

    // A cancel observed at any point wins over a late success or failure.
    let outcome = match result {
        Ok((saved_to, _)) if cancel.is_cancelled() => {
            if let Err(e) = tokio::fs::remove_file(&saved_to).await {
                warn!(transfer = %job.id, "Failed to remove file saved after cancel: {e}");
            }
            TransferOutcome::Cancelled
        }
        _ if cancel.is_cancelled() => TransferOutcome::Cancelled,
        Ok((saved_to, bytes)) => TransferOutcome::Succeeded { saved_to, bytes },
        Err(TransferError::Cancelled) => TransferOutcome::Cancelled,
        Err(e) => TransferOutcome::Failed(e),
    };

    progress.send_modify(|snapshot| {
        snapshot.status = outcome.status();
        match &outcome {
            TransferOutcome::Failed(e) => snapshot.last_error = Some(e.to_string()),
            TransferOutcome::Cancelled => snapshot.bytes_completed = 0,
            TransferOutcome::Succeeded { .. } => {}
        }
    });

    match &outcome {
        TransferOutcome::Succeeded { saved_to, bytes } => info!(
            transfer = %job.id,
            bytes,
            saved_to = %saved_to.display(),
            "Transfer succeeded"
        ),
        TransferOutcome::Failed(e) => warn!(transfer = %job.id, "Transfer failed: {e}"),
        TransferOutcome::Cancelled => info!(transfer = %job.id, "Transfer cancelled"),
    }

    if outcome_tx.send(outcome).is_err() {
        debug!(transfer = %job.id, "Transfer outcome dropped, no receiver");
    }
}

async fn execute(
    job: &TransferJob,
    progress: &watch::Sender<TransferSnapshot>,
    cancel: &CancellationToken,
) -> Result<(PathBuf, u64), TransferError> {
    let file_name = sanitize_file_name(&job.name)?;
    let scratch = ScratchFile::allocate(&job.scratch_dir, &format!("{}-{file_name}.part", job.id))
        .await
        .map_err(|e| TransferError::LocalWriteFailed(format!("scratch allocation failed: {e}")))?;

    checkpoint(cancel)?;

    let bytes = if job.client.capabilities().chunked_read {
        copy_chunked(job, &scratch, progress, cancel).await?
    } else {
        copy_whole(job, &scratch, progress, cancel).await?
    };

    checkpoint(cancel)?;

    progress.send_modify(|snapshot| {
        snapshot.total_bytes = bytes;
        snapshot.bytes_completed = bytes;
    });

    let saved_to = until_cancelled(cancel, job.store.save(scratch.path(), &job.name)).await??;
    Ok((saved_to, bytes))
}

/// Whole-file read: progress jumps from 0 to the full size.
async fn copy_whole(
    job: &TransferJob,
    scratch: &ScratchFile,
    progress: &watch::Sender<TransferSnapshot>,
    cancel: &CancellationToken,
) -> Result<u64, TransferError> {
    debug!(transfer = %job.id, "Reading whole file");
    let data = until_cancelled(cancel, job.client.read_file(&job.remote_path)).await??;
    let bytes = data.len() as u64;
    progress.send_modify(|snapshot| snapshot.bytes_completed = bytes);

    checkpoint(cancel)?;

    until_cancelled(cancel, tokio::fs::write(scratch.path(), &data))
        .await?
        .map_err(|e| TransferError::LocalWriteFailed(e.to_string()))?;
    Ok(bytes)
}

/// Chunked read: progress advances per chunk.
async fn copy_chunked(
    job: &TransferJob,
    scratch: &ScratchFile,
    progress: &watch::Sender<TransferSnapshot>,
    cancel: &CancellationToken,
) -> Result<u64, TransferError> {
    let mut file = tokio::fs::File::create(scratch.path())
        .await
        .map_err(|e| TransferError::LocalWriteFailed(e.to_string()))?;

    let mut offset: u64 = 0;
    loop {
        checkpoint(cancel)?;
        let chunk = until_cancelled(
            cancel,
            job.client.read_chunk(&job.remote_path, offset, job.chunk_size),
        )
        .await??;
        if chunk.is_empty() {
            break;
        }

        checkpoint(cancel)?;
        until_cancelled(cancel, file.write_all(&chunk))
            .await?
            .map_err(|e| TransferError::LocalWriteFailed(e.to_string()))?;

        offset += chunk.len() as u64;
        progress.send_modify(|snapshot| snapshot.bytes_completed = offset);
    }

    until_cancelled(cancel, file.flush())
        .await?
        .map_err(|e| TransferError::LocalWriteFailed(e.to_string()))?;
    debug!(transfer = %job.id, bytes = offset, "Chunked read complete");
    Ok(offset)
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), TransferError> {
    if cancel.is_cancelled() {
        return Err(TransferError::Cancelled);
    }
    Ok(())
}

/// Await `fut` unless the token fires first.
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, TransferError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransferError::Cancelled),
        output = fut => Ok(output),
    }
}
