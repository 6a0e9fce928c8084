//! Signaling client for multi-party WebRTC group-call rooms
//!
//! A client joins a named room, exchanges JSON control messages with the
//! group-call server over a WebSocket, and negotiates one peer connection per
//! visible participant: send-only for itself, receive-only for everyone else.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  RoomClient (single event loop)                      │
//! │  ├─ SignalingChannel (JSON over WebSocket)           │
//! │  └─ RoomSession (state machine)                      │
//! │     ├─ ParticipantRegistry ── Participant            │
//! │     │                         ├─ NegotiationState    │
//! │     │                         └─ TileId              │
//! │     ├─ ChatLog                                       │
//! │     ├─ PeerConnector (RtcPeerConnector: webrtc-rs)   │
//! │     └─ RoomView (ConsoleView)                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use groupcall_client::ClientConfig;
//!
//! let config = ClientConfig {
//!     signaling_url: "wss://calls.example.org/groupcall".to_string(),
//!     ..Default::default()
//! };
//!
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use groupcall_client::{ClientConfig, ConsoleView, RoomClient, RtcPeerConnector, UserAction};
//! use std::sync::Arc;
//!
//! # async fn example() -> groupcall_client::Result<()> {
//! let config = ClientConfig::default();
//! let peers = Arc::new(RtcPeerConnector::new(&config)?);
//! let mut client = RoomClient::connect(config, peers, Box::new(ConsoleView::new())).await?;
//! client.join("alice", "lobby")?;
//!
//! let (actions, rx) = tokio::sync::mpsc::unbounded_channel();
//! actions.send(UserAction::Chat("hello".to_string())).ok();
//! actions.send(UserAction::Leave).ok();
//! let session = client.run(rx).await;
//! assert!(session.registry().is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod participant;
pub mod peer;
pub mod session;
pub mod signaling;
pub mod view;

#[cfg(test)]
mod testing;

pub use chat::{ChatLine, ChatLog, LineParity};
pub use client::{RoomClient, UserAction};
pub use config::{ClientConfig, MediaConstraints, TurnServerConfig, VideoConstraints};
pub use error::{Error, Result};
pub use participant::{NegotiationState, Participant, ParticipantRegistry};
pub use peer::{PeerConnector, PeerDirection, PeerHandle, PeerOffer, RtcPeerConnector};
pub use session::{RoomSession, SessionState};
pub use signaling::{ChannelState, ClientCommand, CommandSink, ServerNotification, SignalingChannel};
pub use view::{ConsoleView, RoomView, TileId};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
