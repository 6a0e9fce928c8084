//! Signaling protocol and channel for group-call rooms
//!
//! JSON commands and notifications exchanged with the server over a
//! persistent WebSocket connection.

pub mod channel;
pub mod protocol;

pub use channel::{ChannelState, CommandSink, SignalingChannel};
pub use protocol::{ClientCommand, ServerNotification};
