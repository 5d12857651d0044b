//! The browse-and-download coordinator the UI drives.
//!
//! [`ShareBrowser`] ties a [`Session`], the cached [`Listing`] and the
//! [`TransferCoordinator`] together and publishes a [`BrowserState`]
//! snapshot on a `watch` channel after every intent. Connection and
//! listing failures land in `last_error`; they are also returned so the
//! caller can react immediately.
//!
//! Methods take `&mut self`, so intents are serialized through the one
//! coordinator instance.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{BrowserSettings, ShareConfig};
use crate::errors::{CoreError, SessionError, TransferError};
use crate::files::{
    breadcrumbs, into_directory, to_breadcrumb_segment, up, Breadcrumb, BrowsePath,
    DirectoryEntry, Listing,
};
use crate::locator::{build_stream_locator, Locator};
use crate::player::Player;
use crate::session::{ConnectionStatus, Session};
use crate::share::ShareConnector;
use crate::store::LocalStore;
use crate::transfer::{TransferCoordinator, TransferHandle, TransferSnapshot};

/// UI-facing snapshot of the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserState {
    pub status: ConnectionStatus,
    pub current_path: BrowsePath,
    pub entries: Vec<DirectoryEntry>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Browses one remote share and downloads from it.
pub struct ShareBrowser {
    connector: Arc<dyn ShareConnector>,
    settings: BrowserSettings,
    session: Session,
    listing: Listing,
    transfers: TransferCoordinator,
    state: watch::Sender<BrowserState>,
}

impl ShareBrowser {
    pub fn new(
        connector: Arc<dyn ShareConnector>,
        settings: BrowserSettings,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let (state, _) = watch::channel(BrowserState {
            breadcrumbs: breadcrumbs(&BrowsePath::root()),
            ..Default::default()
        });
        Ok(Self {
            connector,
            transfers: TransferCoordinator::from_settings(&settings),
            settings,
            session: Session::new(),
            listing: Listing::default(),
            state,
        })
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        self.listing.entries()
    }

    /// Look up an entry of the current listing by its id.
    pub fn entry(&self, id: &Uuid) -> Option<&DirectoryEntry> {
        self.listing.find(id)
    }

    pub fn current_path(&self) -> &BrowsePath {
        self.session.current_path()
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<BrowserState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BrowserState {
        self.state.borrow().clone()
    }

    /// Connect and list the root.
    ///
    /// Any previous connection (and its running transfer) is torn down
    /// first. Succeeds once the session is connected; a failing initial
    /// listing is reported through `last_error` only.
    pub async fn connect(&mut self, config: ShareConfig) -> Result<(), SessionError> {
        if self.session.is_connected() {
            self.disconnect().await;
        }

        self.state.send_modify(|state| {
            state.status = ConnectionStatus::Connecting;
            state.is_loading = true;
            state.last_error = None;
        });

        let deadline = self.settings.connect_timeout();
        if let Err(e) = self
            .session
            .connect(self.connector.as_ref(), config, deadline)
            .await
        {
            self.listing.clear();
            self.publish(false, Some(e.to_string()));
            return Err(e);
        }

        if let Err(e) = self.list(BrowsePath::root()).await {
            warn!("Initial listing failed: {e}");
        }
        Ok(())
    }

    /// Cancel any running transfer, then release the session.
    pub async fn disconnect(&mut self) {
        self.transfers.cancel().await;
        self.session.disconnect().await;
        self.listing.clear();
        self.publish(false, None);
    }

    /// List `path` and make it the current directory.
    ///
    /// On failure the cached listing and current path stay as they were.
    pub async fn list(&mut self, path: BrowsePath) -> Result<(), SessionError> {
        self.state.send_modify(|state| state.is_loading = true);

        let deadline = self.settings.list_timeout();
        match self
            .session
            .list(&path, &self.settings.hidden_marker, deadline)
            .await
        {
            Ok(entries) => {
                info!(path = %path, count = entries.len(), "Directory listed");
                self.session.set_current_path(path.clone());
                self.listing.replace(path, entries);
                self.publish(false, None);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path, "Listing failed: {e}");
                self.publish(false, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Re-list the current directory.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        let current = self.session.current_path().clone();
        self.list(current).await
    }

    pub async fn navigate_into(&mut self, entry: &DirectoryEntry) -> Result<(), SessionError> {
        let target = into_directory(entry)?;
        self.list(target).await
    }

    pub async fn navigate_up(&mut self) -> Result<(), SessionError> {
        let target = up(self.session.current_path());
        self.list(target).await
    }

    /// Jump to breadcrumb `index` (0 is the root).
    ///
    /// An index past the last segment leaves everything unchanged.
    pub async fn navigate_to_breadcrumb(&mut self, index: usize) -> Result<(), SessionError> {
        match to_breadcrumb_segment(self.session.current_path(), index) {
            Some(target) => self.list(target).await,
            None => {
                debug!(index, "Ignoring breadcrumb index past the current path");
                Ok(())
            }
        }
    }

    /// Download `entry` into `store`, cancelling any running download first.
    pub async fn download(
        &mut self,
        entry: &DirectoryEntry,
        store: Arc<dyn LocalStore>,
    ) -> Result<TransferHandle, TransferError> {
        let client = self.session.client()?;
        self.transfers.start(client, entry, store).await
    }

    /// Cancel the running download; no-op when idle.
    pub async fn cancel_download(&mut self) {
        self.transfers.cancel().await;
    }

    /// Progress of the current or last download.
    pub fn transfer(&self) -> Option<TransferSnapshot> {
        self.transfers.current()
    }

    /// Stream locator for `file_path` on the connected share.
    pub fn stream_locator(&self, file_path: &str) -> Result<Locator, SessionError> {
        build_stream_locator(self.session.config(), file_path)
    }

    /// Open a listing entry: directories are navigated into, files are
    /// handed to `player` as a stream locator.
    pub async fn open_entry(
        &mut self,
        entry: &DirectoryEntry,
        player: &dyn Player,
    ) -> Result<(), CoreError> {
        if entry.is_directory {
            self.navigate_into(entry).await?;
            return Ok(());
        }

        let locator = self.stream_locator(&entry.path)?;
        info!(locator = %locator, "Opening stream");
        player.load(&locator).await?;
        Ok(())
    }

    fn publish(&self, is_loading: bool, last_error: Option<String>) {
        let current_path = self.session.current_path().clone();
        self.state.send_replace(BrowserState {
            status: self.session.status(),
            breadcrumbs: breadcrumbs(&current_path),
            current_path,
            entries: self.listing.entries().to_vec(),
            is_loading,
            last_error,
        });
    }
}
