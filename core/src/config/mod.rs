use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::share::Credential;

/// Connection parameters for one remote share.
///
/// - `address`: server locator, with or without a scheme (`smb://10.0.0.5`,
///   `nas.local`, `10.0.0.5:445`).
/// - `username`/`password`: optional; an empty username means guest access.
/// - `share`: name of the share to mount.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub share: String,
}

impl ShareConfig {
    pub fn new(address: &str, share: &str) -> Self {
        Self {
            address: address.to_string(),
            share: share.to_string(),
            ..Default::default()
        }
    }

    /// Attach a username and password.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string()).filter(|u| !u.is_empty());
        self.password = Some(password.to_string()).filter(|p| !p.is_empty());
        self
    }

    /// Credential handed to the share client on connect.
    pub fn credential(&self) -> Credential {
        Credential {
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
        }
    }
}

// Passwords never reach log output.
impl fmt::Debug for ShareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("share", &self.share)
            .finish()
    }
}

/// Tunables for browsing and downloading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSettings {
    /// Entries whose name starts with this marker are hidden from listings.
    #[serde(default = "default_hidden_marker")]
    pub hidden_marker: String,
    /// Directory for in-flight download scratch files; `None` means the OS temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Bytes requested per read from clients that support chunked reads.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: Option<u64>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            hidden_marker: default_hidden_marker(),
            scratch_dir: None,
            chunk_size: default_chunk_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
            list_timeout_secs: default_list_timeout_secs(),
        }
    }
}

impl BrowserSettings {
    /// Parse settings from a JSON document and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Invalid browser settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.hidden_marker.is_empty() {
            return Err(CoreError::Config(
                "hiddenMarker must not be empty".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(CoreError::Config(
                "chunkSize must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved scratch directory.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn list_timeout(&self) -> Option<Duration> {
        self.list_timeout_secs.map(Duration::from_secs)
    }
}

fn default_hidden_marker() -> String {
    ".".to_string()
}

fn default_chunk_size() -> usize {
    256 * 1024
}

fn default_connect_timeout_secs() -> Option<u64> {
    Some(15)
}

fn default_list_timeout_secs() -> Option<u64> {
    Some(30)
}
