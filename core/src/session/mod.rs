//! Connection lifecycle for one remote share.
//!
//! A [`Session`] is either fully connected (client handle held, root listing
//! succeeded) or disconnected. A failed connect never leaves a handle
//! behind, so no half-connected state is observable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShareConfig;
use crate::errors::SessionError;
use crate::files::{list_directory, BrowsePath, DirectoryEntry};
use crate::locator::{normalize_share, parse_server_address};
use crate::share::{ShareClient, ShareConnector};

/// Connection status of a [`Session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Connection context for one remote share.
///
/// # Lifecycle
///
/// 1. Create with [`Session::new()`] (disconnected).
/// 2. [`connect()`](Self::connect) mounts the share and lists the root.
/// 3. [`list()`](Self::list) and [`client()`](Self::client) are available
///    while connected.
/// 4. [`disconnect()`](Self::disconnect) always succeeds.
#[derive(Default)]
pub struct Session {
    config: ShareConfig,
    status: ConnectionStatus,
    current_path: BrowsePath,
    client: Option<Arc<dyn ShareClient>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected && self.client.is_some()
    }

    /// Parameters of the current or most recently attempted connection.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    pub fn current_path(&self) -> &BrowsePath {
        &self.current_path
    }

    pub(crate) fn set_current_path(&mut self, path: BrowsePath) {
        self.current_path = path;
    }

    /// The connected client handle.
    pub fn client(&self) -> Result<Arc<dyn ShareClient>, SessionError> {
        match (&self.status, &self.client) {
            (ConnectionStatus::Connected, Some(client)) => Ok(client.clone()),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Connect to the share described by `config`.
    ///
    /// Validates the address, opens the client, mounts the share and lists
    /// the root to check the share is live. Any existing connection is released
    /// first. On failure the session is left disconnected.
    pub async fn connect(
        &mut self,
        connector: &dyn ShareConnector,
        config: ShareConfig,
        deadline: Option<Duration>,
    ) -> Result<(), SessionError> {
        if self.client.is_some() {
            self.disconnect().await;
        }

        self.config = config;
        self.status = ConnectionStatus::Connecting;

        match self.open(connector, deadline).await {
            Ok(client) => {
                self.client = Some(client);
                self.status = ConnectionStatus::Connected;
                self.current_path = BrowsePath::root();
                info!(
                    address = %self.config.address,
                    share = %self.config.share,
                    "Share connected"
                );
                Ok(())
            }
            Err(e) => {
                self.status = ConnectionStatus::Disconnected;
                self.current_path = BrowsePath::root();
                warn!(address = %self.config.address, "Share connection failed: {e}");
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        connector: &dyn ShareConnector,
        deadline: Option<Duration>,
    ) -> Result<Arc<dyn ShareClient>, SessionError> {
        let address = parse_server_address(&self.config.address)?;
        let share = normalize_share(&self.config.share);
        let credential = self.config.credential();

        debug!(
            host = address.host_str().unwrap_or_default(),
            share = %share,
            guest = credential.is_guest(),
            "Opening share client"
        );

        let client = with_deadline(deadline, async {
            connector
                .connect(&address, &credential, &share)
                .await
                .map_err(|e| SessionError::ConnectFailed(e.to_string()))
        })
        .await?;

        let root_check = with_deadline(deadline, async {
            client
                .list_directory("/")
                .await
                .map_err(|e| SessionError::ConnectFailed(format!("root listing failed: {e}")))
        })
        .await;

        if let Err(e) = root_check {
            if let Err(release) = client.disconnect().await {
                debug!("Ignoring release error after failed root listing: {release}");
            }
            return Err(e);
        }

        Ok(client)
    }

    /// Release the connection.
    ///
    /// Always ends disconnected at the root; release errors are logged and
    /// swallowed.
    pub async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect().await {
                warn!("Ignoring error while releasing share: {e}");
            }
            info!(address = %self.config.address, "Share disconnected");
        }
        self.status = ConnectionStatus::Disconnected;
        self.current_path = BrowsePath::root();
    }

    /// Fetch the filtered, ordered entries of `path`.
    ///
    /// Does not change the current path; the caller decides what a
    /// successful listing means for navigation.
    pub async fn list(
        &self,
        path: &BrowsePath,
        hidden_marker: &str,
        deadline: Option<Duration>,
    ) -> Result<Vec<DirectoryEntry>, SessionError> {
        let client = self.client()?;
        with_deadline(deadline, list_directory(client.as_ref(), path, hidden_marker)).await
    }
}

/// Run `fut`, failing with [`SessionError::Timeout`] once `deadline` elapses.
pub(crate) async fn with_deadline<T, F>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SessionError::Timeout(limit))?,
        None => fut.await,
    }
}
