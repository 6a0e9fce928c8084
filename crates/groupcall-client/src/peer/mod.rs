//! Peer connections negotiated on behalf of room participants

pub mod connector;
pub mod rtc;

pub use connector::{PeerConnector, PeerDirection, PeerHandle, PeerOffer};
pub use rtc::RtcPeerConnector;
