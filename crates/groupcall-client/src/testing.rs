//! Recording fakes for the session's collaborators

use crate::chat::ChatLine;
use crate::config::MediaConstraints;
use crate::peer::{PeerConnector, PeerDirection, PeerHandle, PeerOffer};
use crate::signaling::{ClientCommand, CommandSink};
use crate::view::{RoomView, TileId};
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct ConnectorState {
    send_only: usize,
    receive_only: usize,
    answers: usize,
    disposed: usize,
    live: HashSet<Uuid>,
}

/// Peer connector issuing fake offers and counting every call
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl FakeConnector {
    pub fn send_only_count(&self) -> usize {
        self.state.lock().send_only
    }

    pub fn receive_only_count(&self) -> usize {
        self.state.lock().receive_only
    }

    pub fn answer_count(&self) -> usize {
        self.state.lock().answers
    }

    pub fn disposed_count(&self) -> usize {
        self.state.lock().disposed
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    fn offer(&self, direction: PeerDirection) -> PeerOffer {
        let handle = PeerHandle::new(direction);
        self.state.lock().live.insert(handle.id());
        PeerOffer {
            sdp: format!("v=0 {}", handle),
            handle,
        }
    }
}

#[async_trait]
impl PeerConnector for FakeConnector {
    async fn create_send_only(&self, _constraints: &MediaConstraints) -> Result<PeerOffer> {
        self.state.lock().send_only += 1;
        Ok(self.offer(PeerDirection::SendOnly))
    }

    async fn create_receive_only(&self, _constraints: &MediaConstraints) -> Result<PeerOffer> {
        self.state.lock().receive_only += 1;
        Ok(self.offer(PeerDirection::ReceiveOnly))
    }

    async fn apply_remote_answer(&self, handle: &PeerHandle, _sdp_answer: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.live.contains(&handle.id()) {
            return Err(Error::PeerConnectionError(format!("No connection for {}", handle)));
        }
        state.answers += 1;
        Ok(())
    }

    async fn dispose(&self, handle: PeerHandle) {
        let mut state = self.state.lock();
        state.live.remove(&handle.id());
        state.disposed += 1;
    }
}

struct SinkState {
    open: bool,
    sent: Vec<ClientCommand>,
    close_calls: usize,
}

/// Command sink recording every command it accepts
#[derive(Clone)]
pub(crate) struct RecordingSink {
    state: Arc<Mutex<SinkState>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                open: true,
                sent: Vec::new(),
                close_calls: 0,
            })),
        }
    }
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<ClientCommand> {
        self.state.lock().sent.clone()
    }

    pub fn sent_kinds(&self) -> Vec<&'static str> {
        self.state.lock().sent.iter().map(|c| c.kind()).collect()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: &ClientCommand) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::ChannelClosed);
        }
        state.sent.push(command.clone());
        Ok(())
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.open = false;
        state.close_calls += 1;
    }
}

#[derive(Default)]
struct ViewState {
    next_tile: u64,
    tiles: HashMap<TileId, (String, String)>,
    featured: Option<TileId>,
    chat: Vec<ChatLine>,
    rosters: Vec<Vec<String>>,
    room: Option<String>,
    exits: usize,
}

/// View keeping everything it was asked to render
#[derive(Clone, Default)]
pub(crate) struct RecordingView {
    state: Arc<Mutex<ViewState>>,
}

impl RecordingView {
    pub fn live_tiles(&self) -> Vec<TileId> {
        self.state.lock().tiles.keys().copied().collect()
    }

    pub fn label(&self, tile: TileId) -> Option<String> {
        self.state.lock().tiles.get(&tile).map(|(_, label)| label.clone())
    }

    pub fn featured_name(&self) -> Option<String> {
        let state = self.state.lock();
        state
            .featured
            .and_then(|tile| state.tiles.get(&tile))
            .map(|(name, _)| name.clone())
    }

    pub fn chat_texts(&self) -> Vec<String> {
        self.state.lock().chat.iter().map(|l| l.render()).collect()
    }

    pub fn last_roster(&self) -> Option<Vec<String>> {
        self.state.lock().rosters.last().cloned()
    }

    pub fn room(&self) -> Option<String> {
        self.state.lock().room.clone()
    }

    pub fn exits(&self) -> usize {
        self.state.lock().exits
    }
}

impl RoomView for RecordingView {
    fn create_tile(&mut self, name: &str, _is_local_user: bool) -> TileId {
        let mut state = self.state.lock();
        let tile = TileId::new(state.next_tile);
        state.next_tile += 1;
        state.tiles.insert(tile, (name.to_string(), String::new()));
        tile
    }

    fn update_tile(&mut self, tile: TileId, label: &str) {
        if let Some(entry) = self.state.lock().tiles.get_mut(&tile) {
            entry.1 = label.to_string();
        }
    }

    fn remove_tile(&mut self, tile: TileId) {
        self.state.lock().tiles.remove(&tile);
    }

    fn set_featured(&mut self, tile: Option<TileId>) {
        self.state.lock().featured = tile;
    }

    fn append_chat(&mut self, line: &ChatLine) {
        self.state.lock().chat.push(line.clone());
    }

    fn show_roster(&mut self, entries: &[String]) {
        self.state.lock().rosters.push(entries.to_vec());
    }

    fn room_entered(&mut self, room: &str) {
        self.state.lock().room = Some(room.to_string());
    }

    fn room_exited(&mut self) {
        let mut state = self.state.lock();
        state.room = None;
        state.exits += 1;
    }
}
