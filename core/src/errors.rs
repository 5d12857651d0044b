//! Unified error types for the sharecast core crate.
//!
//! Each concern owns its own enum. The remote share collaborator reports
//! [`ShareError`]; the session and transfer layers translate those into the
//! user-facing [`SessionError`] and [`TransferError`] taxonomies. Consumers
//! that want a single type can use [`CoreError`].

use std::time::Duration;

use thiserror::Error;

/// Top-level error type encompassing all core error categories.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A session, listing or navigation error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A download error.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// An error reported by the remote share client.
    #[error("Share error: {0}")]
    Share(#[from] ShareError),

    /// An error reported by the player collaborator.
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// A configuration error (invalid values, parse failures).
    #[error("Config error: {0}")]
    Config(String),

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a remote share client implementation.
#[derive(Error, Debug)]
pub enum ShareError {
    /// The requested file or directory does not exist on the share.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server rejected the supplied credential.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The named share does not exist or cannot be mounted.
    #[error("Share not found: {0}")]
    ShareNotFound(String),

    /// A protocol or network operation failed.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The client does not implement the requested operation.
    #[error("Operation not supported by this share client")]
    NotSupported,

    /// A low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by connecting, listing and navigating.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The server address is empty or not a well-formed locator.
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    /// The operation requires a connected session.
    #[error("Not connected to a share")]
    NotConnected,

    /// Connecting, mounting the share or probing the root failed.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// Fetching a directory listing failed.
    #[error("Listing failed: {0}")]
    ListFailed(String),

    /// Navigation targeted an entry that is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A connect or list operation exceeded its configured deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors terminating a single download.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The download was requested without a connected session.
    #[error("Not connected to a share")]
    NotConnected,

    /// Reading bytes from the remote share failed.
    #[error("Remote read failed: {0}")]
    RemoteReadFailed(String),

    /// Writing the scratch file or persisting it to the local store failed.
    #[error("Local write failed: {0}")]
    LocalWriteFailed(String),

    /// The download was cancelled before it completed.
    #[error("Transfer cancelled")]
    Cancelled,
}

/// Errors raised by a local store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The save was abandoned by its caller before the file was committed.
    #[error("Save abandoned before completion")]
    Abandoned,

    /// The suggested file name is empty or only made of path separators.
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    /// A low-level I/O error while persisting the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a player implementation.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The player could not open the supplied locator.
    #[error("Failed to open media: {0}")]
    OpenFailed(String),

    /// A playback control call failed.
    #[error("Playback control failed: {0}")]
    ControlFailed(String),
}

impl From<ShareError> for TransferError {
    fn from(err: ShareError) -> Self {
        TransferError::RemoteReadFailed(err.to_string())
    }
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        TransferError::LocalWriteFailed(err.to_string())
    }
}

impl From<SessionError> for TransferError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotConnected => TransferError::NotConnected,
            other => TransferError::RemoteReadFailed(other.to_string()),
        }
    }
}
