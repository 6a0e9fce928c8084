//! Name-keyed directory of the participants in one room session

use super::participant::Participant;
use crate::peer::PeerConnector;
use crate::view::RoomView;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Owns every [`Participant`] of a room session, keyed by name
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<String, Participant>,
}

impl ParticipantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a participant, rendering its tile
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateParticipant`] if the name is already taken;
    /// no tile is created in that case.
    pub fn create(
        &mut self,
        name: &str,
        is_admin: bool,
        is_visible: bool,
        is_local_user: bool,
        view: &mut dyn RoomView,
    ) -> Result<&mut Participant> {
        if self.participants.contains_key(name) {
            return Err(Error::DuplicateParticipant(name.to_string()));
        }

        let tile = view.create_tile(name, is_local_user);
        let participant = Participant::new(name, is_admin, is_visible, is_local_user, tile);
        view.update_tile(tile, &participant.info_label());

        info!(
            participant = %name,
            is_admin,
            is_visible,
            is_local_user,
            "Participant registered"
        );

        Ok(self
            .participants
            .entry(name.to_string())
            .or_insert(participant))
    }

    /// Look up a participant by name
    pub fn get(&self, name: &str) -> Result<&Participant> {
        self.participants
            .get(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))
    }

    /// Look up a participant by name for mutation
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Participant> {
        self.participants
            .get_mut(name)
            .ok_or_else(|| Error::UnknownParticipant(name.to_string()))
    }

    /// Check if a participant is registered
    pub fn contains(&self, name: &str) -> bool {
        self.participants.contains_key(name)
    }

    /// Dispose a participant's peer connection and tile, then forget it
    ///
    /// Returns `false` if no participant had that name.
    pub async fn remove(
        &mut self,
        name: &str,
        peers: &dyn PeerConnector,
        view: &mut dyn RoomView,
    ) -> bool {
        match self.participants.remove(name) {
            Some(participant) => {
                participant.dispose(peers, view).await;
                true
            }
            None => {
                debug!(participant = %name, "Remove requested for unregistered participant");
                false
            }
        }
    }

    /// Dispose and forget every participant
    pub async fn clear(&mut self, peers: &dyn PeerConnector, view: &mut dyn RoomView) {
        debug!("Clearing {} participants", self.participants.len());
        for (_, participant) in self.participants.drain() {
            participant.dispose(peers, view).await;
        }
    }

    /// The local user's record, once the roster has been received
    pub fn local_user(&self) -> Option<&Participant> {
        self.participants.values().find(|p| p.is_local_user())
    }

    /// Number of registered participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Check if no participant is registered
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Iterate over participants in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Names of all participants, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.participants.keys().cloned().collect();
        names.sort();
        names
    }
}
