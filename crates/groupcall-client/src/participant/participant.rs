//! Per-user state within a room

use crate::peer::{PeerConnector, PeerHandle};
use crate::view::{RoomView, TileId};
use tracing::debug;

/// Negotiation status of a participant's peer connection
#[derive(Debug, PartialEq, Eq)]
pub enum NegotiationState {
    /// No peer connection exists
    NoPeer,
    /// An offer was forwarded and the answer is pending
    OfferSent(PeerHandle),
    /// The remote answer has been applied
    Negotiated(PeerHandle),
}

impl NegotiationState {
    /// The handle held in this state, if any
    pub fn handle(&self) -> Option<&PeerHandle> {
        match self {
            NegotiationState::NoPeer => None,
            NegotiationState::OfferSent(handle) | NegotiationState::Negotiated(handle) => {
                Some(handle)
            }
        }
    }
}

/// One user's session-local state and its associated peer and tile
#[derive(Debug)]
pub struct Participant {
    name: String,
    is_admin: bool,
    is_visible: bool,
    is_local_user: bool,
    negotiation: NegotiationState,
    tile: TileId,
}

impl Participant {
    /// Create a participant bound to an already rendered tile
    pub fn new(
        name: impl Into<String>,
        is_admin: bool,
        is_visible: bool,
        is_local_user: bool,
        tile: TileId,
    ) -> Self {
        Self {
            name: name.into(),
            is_admin,
            is_visible,
            is_local_user,
            negotiation: NegotiationState::NoPeer,
            tile,
        }
    }

    /// Participant name, unique within the room
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the participant administers the room
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Whether the participant is offering video
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// Whether this record is the local user
    pub fn is_local_user(&self) -> bool {
        self.is_local_user
    }

    /// Tile rendering this participant
    pub fn tile(&self) -> TileId {
        self.tile
    }

    /// Current negotiation status
    pub fn negotiation(&self) -> &NegotiationState {
        &self.negotiation
    }

    /// Handle of the participant's peer connection, negotiated or not
    pub fn peer_handle(&self) -> Option<&PeerHandle> {
        self.negotiation.handle()
    }

    /// Whether the participant holds a usable peer connection
    ///
    /// The local user's send-only connection counts as soon as it exists; a
    /// remote participant's connection only once its answer is applied.
    pub fn has_live_peer(&self) -> bool {
        if !self.is_visible {
            return false;
        }
        match &self.negotiation {
            NegotiationState::NoPeer => false,
            NegotiationState::OfferSent(_) => self.is_local_user,
            NegotiationState::Negotiated(_) => true,
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
    }

    /// Record a freshly offered connection, returning any handle it replaces
    pub(crate) fn offer_sent(&mut self, handle: PeerHandle) -> Option<PeerHandle> {
        let previous =
            std::mem::replace(&mut self.negotiation, NegotiationState::OfferSent(handle));
        Self::into_handle(previous)
    }

    /// Move `OfferSent` to `Negotiated`; any other state is left untouched
    pub(crate) fn mark_negotiated(&mut self) -> bool {
        match std::mem::replace(&mut self.negotiation, NegotiationState::NoPeer) {
            NegotiationState::OfferSent(handle) => {
                self.negotiation = NegotiationState::Negotiated(handle);
                true
            }
            other => {
                self.negotiation = other;
                false
            }
        }
    }

    /// Detach the peer handle, leaving the participant in `NoPeer`
    pub(crate) fn take_peer(&mut self) -> Option<PeerHandle> {
        Self::into_handle(std::mem::replace(
            &mut self.negotiation,
            NegotiationState::NoPeer,
        ))
    }

    fn into_handle(state: NegotiationState) -> Option<PeerHandle> {
        match state {
            NegotiationState::NoPeer => None,
            NegotiationState::OfferSent(handle) | NegotiationState::Negotiated(handle) => {
                Some(handle)
            }
        }
    }

    /// Status suffix shown next to the participant's name
    pub fn info_label(&self) -> String {
        let mut label = String::new();
        if self.is_local_user {
            label.push_str(" (You!)");
        }
        if self.is_admin {
            label.push_str(" (Admin)");
        }
        label.push_str(if self.is_visible {
            " (Visible)"
        } else {
            " (Not visible)"
        });
        label
    }

    /// Release the peer connection and the tile
    pub(crate) async fn dispose(mut self, peers: &dyn PeerConnector, view: &mut dyn RoomView) {
        debug!(participant = %self.name, "Disposing participant");
        if let Some(handle) = self.take_peer() {
            peers.dispose(handle).await;
        }
        view.remove_tile(self.tile);
    }
}
