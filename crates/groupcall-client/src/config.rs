//! Configuration types for the group-call client

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for a [`RoomClient`](crate::client::RoomClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// WebSocket signaling endpoint (ws:// or wss://), normally ending in `/groupcall`
    pub signaling_url: String,

    /// STUN server URLs (at least one required)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Capture constraints used for every peer connection
    pub media: MediaConstraints,

    /// How long to wait for the server to confirm our own departure (default: 5000ms)
    pub leave_timeout_ms: u64,
}

/// TURN server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn:// or turns://)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

/// Media constraints handed to the peer-connection collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    /// Whether an audio stream is negotiated
    pub audio: bool,

    /// Video stream bounds
    pub video: VideoConstraints,
}

/// Bounds for the negotiated video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConstraints {
    /// Maximum width in pixels
    pub max_width: u32,
    /// Maximum height in pixels
    pub max_height: u32,
    /// Minimum frame rate in fps
    pub min_frame_rate: u32,
    /// Maximum frame rate in fps
    pub max_frame_rate: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:8080/groupcall".to_string(),
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            turn_servers: Vec::new(),
            media: MediaConstraints::default(),
            leave_timeout_ms: 5000,
        }
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: VideoConstraints::default(),
        }
    }
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            max_width: 80,
            max_height: 80,
            min_frame_rate: 8,
            max_frame_rate: 8,
        }
    }
}

impl VideoConstraints {
    /// Maximum frame size in 16x16 macroblocks, as used by the VP8 `max-fs` parameter
    pub fn max_frame_size_macroblocks(&self) -> u32 {
        self.max_width.div_ceil(16) * self.max_height.div_ceil(16)
    }
}

impl ClientConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            Error::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Leave timeout as a [`Duration`]
    pub fn leave_timeout(&self) -> Duration {
        Duration::from_millis(self.leave_timeout_ms)
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a valid WebSocket URL
    /// - `stun_servers` is empty
    /// - the video bounds are zero or inverted
    /// - `leave_timeout_ms` is zero
    pub fn validate(&self) -> Result<()> {
        if !self.signaling_url.starts_with("ws://") && !self.signaling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must start with ws:// or wss://, got {}",
                self.signaling_url
            )));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        for turn in &self.turn_servers {
            if !turn.url.starts_with("turn:") && !turn.url.starts_with("turns:") {
                return Err(Error::InvalidConfig(format!(
                    "TURN url must start with turn: or turns:, got {}",
                    turn.url
                )));
            }
        }

        let video = &self.media.video;
        if video.max_width == 0 || video.max_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "video bounds must be non-zero, got {}x{}",
                video.max_width, video.max_height
            )));
        }

        if video.max_frame_rate == 0 || video.min_frame_rate > video.max_frame_rate {
            return Err(Error::InvalidConfig(format!(
                "frame rate range {}-{} is invalid",
                video.min_frame_rate, video.max_frame_rate
            )));
        }

        if self.leave_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "leave_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
