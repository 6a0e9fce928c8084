//! Peer-connection collaborator
//!
//! The session never touches ICE, SDP or media directly. It asks a
//! [`PeerConnector`] for send-only or receive-only connections, forwards the
//! produced offers over signaling, and hands answers back.

use crate::config::MediaConstraints;
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

/// Media direction of a peer connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerDirection {
    /// Publishes the local user's media
    SendOnly,
    /// Receives one remote participant's media
    ReceiveOnly,
}

/// Opaque, non-clonable reference to one peer connection
///
/// Owned by exactly one participant and consumed by [`PeerConnector::dispose`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PeerHandle {
    id: Uuid,
    direction: PeerDirection,
}

impl PeerHandle {
    /// Issue a fresh handle
    pub fn new(direction: PeerDirection) -> Self {
        Self {
            id: Uuid::new_v4(),
            direction,
        }
    }

    /// Handle identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Media direction of the connection behind this handle
    pub fn direction(&self) -> PeerDirection {
        self.direction
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PeerDirection::SendOnly => "send",
            PeerDirection::ReceiveOnly => "recv",
        };
        write!(f, "{}-{}", dir, self.id)
    }
}

/// A freshly created connection together with its local SDP offer
#[derive(Debug)]
pub struct PeerOffer {
    /// Local SDP offer to forward via `receiveVideoFrom`
    pub sdp: String,
    /// Handle to the new connection
    pub handle: PeerHandle,
}

/// Creates, completes and tears down peer connections
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Create a connection that only sends local media
    async fn create_send_only(&self, constraints: &MediaConstraints) -> Result<PeerOffer>;

    /// Create a connection that only receives remote media
    async fn create_receive_only(&self, constraints: &MediaConstraints) -> Result<PeerOffer>;

    /// Complete negotiation with the server's SDP answer
    async fn apply_remote_answer(&self, handle: &PeerHandle, sdp_answer: &str) -> Result<()>;

    /// Release the connection; failures are the connector's to log
    async fn dispose(&self, handle: PeerHandle);
}
