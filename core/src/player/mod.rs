//! The media player collaborator.
//!
//! Decoding and rendering live outside this crate. The browser only hands
//! the player a [`Locator`] and forwards playback controls; it never
//! inspects media internals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PlayerError;
use crate::locator::Locator;

/// Playback state reported by a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Opening,
    Playing,
    Paused,
    Ended,
    Error,
}

/// Position and length of the loaded media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub position: Duration,
    pub length: Option<Duration>,
    pub rate: f32,
}

/// An opaque media engine.
#[async_trait::async_trait]
pub trait Player: Send + Sync {
    /// Open `locator` and begin playback.
    ///
    /// Remote locators carry their own credentials; implementations must
    /// not log [`Locator::expose`].
    async fn load(&self, locator: &Locator) -> Result<(), PlayerError>;

    async fn play(&self) -> Result<(), PlayerError>;

    async fn pause(&self) -> Result<(), PlayerError>;

    async fn seek(&self, position: Duration) -> Result<(), PlayerError>;

    async fn set_rate(&self, rate: f32) -> Result<(), PlayerError>;

    /// Select an embedded subtitle track; `None` disables subtitles.
    async fn select_subtitle_track(&self, track: Option<i32>) -> Result<(), PlayerError>;

    /// Attach an external subtitle file.
    async fn load_subtitle(&self, locator: &Locator) -> Result<(), PlayerError>;

    /// Shift subtitles relative to the video; negative values show them earlier.
    async fn set_subtitle_delay(&self, delay_ms: i64) -> Result<(), PlayerError>;

    fn status(&self) -> PlaybackStatus;
}
