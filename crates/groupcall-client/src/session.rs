//! Room session controller
//!
//! Interprets server notifications one at a time and turns them into registry
//! mutations, peer-connection requests and view updates.
//!
//! ```text
//! Unjoined --join--> Joining --existingParticipants--> InRoom
//!                                                        |
//!                               leave (leaveRoom sent)   v
//! Left <--participantLeft{isyou} / channel closed-- Leaving
//! ```
//!
//! A self-departure or a closed channel also reaches `Left` directly from
//! `Joining` or `InRoom`.

use crate::chat::{ChatLog, WELCOME_TEXT};
use crate::config::MediaConstraints;
use crate::participant::{NegotiationState, ParticipantRegistry};
use crate::peer::{PeerConnector, PeerOffer};
use crate::signaling::protocol::{
    ChatMessage, ExistingParticipants, ParticipantInfo, ParticipantLeft, VideoAnswer,
    VisibilityUpdate,
};
use crate::signaling::{ClientCommand, CommandSink, ServerNotification};
use crate::view::RoomView;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a room session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joining,
    InRoom,
    Leaving,
    Left,
}

impl SessionState {
    /// Whether server notifications are still interpreted
    pub fn accepts_notifications(&self) -> bool {
        matches!(
            self,
            SessionState::Joining | SessionState::InRoom | SessionState::Leaving
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Unjoined => "unjoined",
            SessionState::Joining => "joining",
            SessionState::InRoom => "in-room",
            SessionState::Leaving => "leaving",
            SessionState::Left => "left",
        };
        f.write_str(s)
    }
}

/// State of one room session, from join until the session is left
pub struct RoomSession {
    local_name: String,
    room: String,
    state: SessionState,
    registry: ParticipantRegistry,
    chat: ChatLog,
    featured: Option<String>,
    constraints: MediaConstraints,
    sink: Arc<dyn CommandSink>,
    peers: Arc<dyn PeerConnector>,
    view: Box<dyn RoomView>,
}

impl RoomSession {
    /// Create an unjoined session
    ///
    /// # Arguments
    ///
    /// * `sink` - connected signaling channel
    /// * `peers` - peer-connection collaborator
    /// * `view` - presentation collaborator
    /// * `constraints` - media constraints for every peer connection
    pub fn new(
        sink: Arc<dyn CommandSink>,
        peers: Arc<dyn PeerConnector>,
        view: Box<dyn RoomView>,
        constraints: MediaConstraints,
    ) -> Self {
        Self {
            local_name: String::new(),
            room: String::new(),
            state: SessionState::Unjoined,
            registry: ParticipantRegistry::new(),
            chat: ChatLog::new(),
            featured: None,
            constraints,
            sink,
            peers,
            view,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Name of the participant whose tile is featured
    pub fn featured(&self) -> Option<&str> {
        self.featured.as_deref()
    }

    /// Ask the server to admit us to `room` as `name`
    pub fn join(&mut self, name: &str, room: &str) -> Result<()> {
        if self.state != SessionState::Unjoined {
            return Err(Error::InvalidState(format!(
                "cannot join while {}",
                self.state
            )));
        }

        let name = name.trim();
        let room = room.trim();
        if name.is_empty() || room.is_empty() {
            return Err(Error::InvalidState(
                "name and room must not be empty".to_string(),
            ));
        }

        self.sink.send(&ClientCommand::JoinRoom {
            name: name.to_string(),
            room: room.to_string(),
        })?;

        self.local_name = name.to_string();
        self.room = room.to_string();
        self.state = SessionState::Joining;

        info!(participant = %self.local_name, room = %self.room, "Joining room");

        self.view.room_entered(&self.room);
        let line = self.chat.append_system(WELCOME_TEXT);
        self.view.append_chat(line);

        Ok(())
    }

    /// Apply one server notification
    ///
    /// Failures are logged; none of them ends the session.
    pub async fn handle(&mut self, notification: ServerNotification) {
        if !self.state.accepts_notifications() {
            debug!(
                kind = notification.kind(),
                state = %self.state,
                "Ignoring notification outside of a room"
            );
            return;
        }

        let kind = notification.kind().to_string();
        let result = match notification {
            ServerNotification::ExistingParticipants(roster) => {
                self.on_existing_participants(roster).await
            }
            ServerNotification::NewParticipantArrived(info) => self.add_remote(info).await,
            ServerNotification::ParticipantLeft(left) => self.on_participant_left(left).await,
            ServerNotification::ReceiveVideoAnswer(answer) => self.on_video_answer(answer).await,
            ServerNotification::UpdateVisibility(update) => {
                self.on_visibility_update(update).await
            }
            ServerNotification::ChatMessageReceived(message) => {
                self.on_chat_message(message);
                Ok(())
            }
            ServerNotification::Unknown { kind } => Err(Error::UnrecognizedMessageKind(kind)),
        };

        if let Err(e) = result {
            warn!(kind = %kind, "Notification not applied: {}", e);
        }
    }

    /// Send `leaveRoom`; teardown waits for the server's echo
    pub fn leave(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Joining | SessionState::InRoom) {
            return Err(Error::InvalidState(format!(
                "cannot leave while {}",
                self.state
            )));
        }

        self.sink.send(&ClientCommand::LeaveRoom)?;
        self.state = SessionState::Leaving;
        info!(room = %self.room, "Leaving room");
        Ok(())
    }

    /// Broadcast a chat line; whitespace-only text is rejected locally
    pub fn send_chat(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::EmptyChatMessage);
        }
        self.require_in_room()?;

        self.sink.send(&ClientCommand::Chat {
            name: self.local_name.clone(),
            room: self.room.clone(),
            text: text.to_string(),
        })
    }

    /// Ask the server to flip our visibility
    ///
    /// Local state changes only when the matching `updateVisibility` arrives.
    pub fn request_visibility_change(&mut self) -> Result<()> {
        self.require_in_room()?;
        self.sink.send(&ClientCommand::ChangeVisibility {
            name: self.local_name.clone(),
        })
    }

    /// Toggle whether `name`'s tile is featured
    ///
    /// Clicking our own tile also requests a visibility change.
    pub fn click_tile(&mut self, name: &str) -> Result<()> {
        let participant = self.registry.get(name)?;
        let tile = participant.tile();
        let is_local_user = participant.is_local_user();

        if self.featured.as_deref() == Some(name) {
            self.featured = None;
            self.view.set_featured(None);
        } else {
            self.featured = Some(name.to_string());
            self.view.set_featured(Some(tile));
        }

        if is_local_user {
            self.request_visibility_change()?;
        }
        Ok(())
    }

    /// Hand the current roster to the view
    pub fn show_roster(&mut self) {
        let mut entries: Vec<String> = self
            .registry
            .iter()
            .map(|p| format!("{}{}", p.name(), p.info_label()))
            .collect();
        entries.sort();
        self.view.show_roster(&entries);
    }

    /// The signaling transport went away underneath us
    pub async fn handle_channel_closed(&mut self) {
        if !self.state.accepts_notifications() {
            return;
        }
        warn!(state = %self.state, "Signaling channel closed, leaving room");
        self.teardown().await;
    }

    fn require_in_room(&self) -> Result<()> {
        if self.state == SessionState::InRoom {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "not in a room (currently {})",
                self.state
            )))
        }
    }

    async fn on_existing_participants(&mut self, roster: ExistingParticipants) -> Result<()> {
        if self.state != SessionState::Joining {
            return Err(Error::InvalidState(format!(
                "participant roster received while {}",
                self.state
            )));
        }

        self.registry.create(
            &self.local_name,
            roster.is_new_user_admin,
            roster.is_new_user_visible,
            true,
            self.view.as_mut(),
        )?;
        self.feature_if_first(&self.local_name.clone());
        self.state = SessionState::InRoom;

        info!(
            room = %self.room,
            participants = roster.data.len() + 1,
            "Entered room"
        );

        if roster.is_new_user_visible {
            if let Err(e) = self.start_broadcast().await {
                warn!("Failed to start local video: {}", e);
            }
        }

        for info in roster.data {
            if info.name == self.local_name {
                continue;
            }
            let name = info.name.clone();
            if let Err(e) = self.add_remote(info).await {
                warn!(participant = %name, "Failed to add participant: {}", e);
            }
        }

        Ok(())
    }

    async fn add_remote(&mut self, info: ParticipantInfo) -> Result<()> {
        self.registry.create(
            &info.name,
            info.is_admin,
            info.is_visible,
            false,
            self.view.as_mut(),
        )?;
        self.feature_if_first(&info.name);

        if info.is_visible {
            self.request_remote_video(&info.name).await?;
        }
        Ok(())
    }

    async fn on_participant_left(&mut self, left: ParticipantLeft) -> Result<()> {
        if left.is_you {
            info!(room = %self.room, "Server confirmed our departure");
            self.teardown().await;
            return Ok(());
        }

        if !self
            .registry
            .remove(&left.name, self.peers.as_ref(), self.view.as_mut())
            .await
        {
            return Err(Error::UnknownParticipant(left.name));
        }

        if self.featured.as_deref() == Some(left.name.as_str()) {
            self.featured = None;
            self.view.set_featured(None);
        }

        info!(participant = %left.name, "Participant left");
        let line = self.chat.append_system(format!("{} left the room", left.name));
        self.view.append_chat(line);
        Ok(())
    }

    async fn on_video_answer(&mut self, answer: VideoAnswer) -> Result<()> {
        let participant = self.registry.get_mut(&answer.name)?;

        let handle = match participant.negotiation() {
            NegotiationState::OfferSent(handle) => handle,
            other => {
                warn!(
                    participant = %answer.name,
                    state = ?other,
                    "Ignoring video answer without a pending offer"
                );
                return Ok(());
            }
        };

        self.peers
            .apply_remote_answer(handle, &answer.sdp_answer)
            .await?;
        participant.mark_negotiated();

        debug!(participant = %answer.name, "Negotiation complete");
        Ok(())
    }

    async fn on_visibility_update(&mut self, update: VisibilityUpdate) -> Result<()> {
        let participant = self.registry.get_mut(&update.user)?;
        participant.set_visible(update.visibility);
        let is_local_user = participant.is_local_user();
        let stale = participant.take_peer();
        self.view
            .update_tile(participant.tile(), &participant.info_label());

        info!(
            participant = %update.user,
            visible = update.visibility,
            "Visibility changed"
        );

        if let Some(handle) = stale {
            self.peers.dispose(handle).await;
        }

        match (update.visibility, is_local_user) {
            (true, true) => self.start_broadcast().await,
            (true, false) => self.request_remote_video(&update.user).await,
            (false, _) => Ok(()),
        }
    }

    fn on_chat_message(&mut self, message: ChatMessage) {
        let line = self.chat.append_message(message);
        self.view.append_chat(line);
    }

    /// Offer the local user's media to the room
    async fn start_broadcast(&mut self) -> Result<()> {
        let offer = self.peers.create_send_only(&self.constraints).await?;
        let name = self.local_name.clone();
        self.forward_offer(&name, offer).await
    }

    /// Ask for one remote participant's media
    async fn request_remote_video(&mut self, name: &str) -> Result<()> {
        let offer = self.peers.create_receive_only(&self.constraints).await?;
        self.forward_offer(name, offer).await
    }

    async fn forward_offer(&mut self, name: &str, offer: PeerOffer) -> Result<()> {
        let sent = self.sink.send(&ClientCommand::ReceiveVideoFrom {
            sender: name.to_string(),
            sdp_offer: offer.sdp,
        });

        let participant = match (sent, self.registry.get_mut(name)) {
            (Ok(()), Ok(participant)) => participant,
            (Err(e), _) | (Ok(()), Err(e)) => {
                self.peers.dispose(offer.handle).await;
                return Err(e);
            }
        };

        if let Some(replaced) = participant.offer_sent(offer.handle) {
            self.peers.dispose(replaced).await;
        }
        debug!(participant = %name, "Video offer sent");
        Ok(())
    }

    fn feature_if_first(&mut self, name: &str) {
        if self.featured.is_some() {
            return;
        }
        if let Ok(participant) = self.registry.get(name) {
            self.view.set_featured(Some(participant.tile()));
            self.featured = Some(name.to_string());
        }
    }

    /// Dispose everything and return to the pre-join view
    async fn teardown(&mut self) {
        self.state = SessionState::Leaving;
        self.registry
            .clear(self.peers.as_ref(), self.view.as_mut())
            .await;
        self.featured = None;
        self.view.room_exited();
        self.sink.close();
        self.state = SessionState::Left;
        info!(room = %self.room, "Left room");
    }
}

impl fmt::Debug for RoomSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomSession")
            .field("local_name", &self.local_name)
            .field("room", &self.room)
            .field("state", &self.state)
            .field("participants", &self.registry.len())
            .field("featured", &self.featured)
            .finish()
    }
}
