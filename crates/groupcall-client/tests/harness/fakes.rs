//! Counting fakes for the session's collaborators

use async_trait::async_trait;
use groupcall_client::{
    ChatLine, MediaConstraints, PeerConnector, PeerDirection, PeerHandle, PeerOffer, Result,
    RoomView, TileId,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct Counts {
    send_only: usize,
    receive_only: usize,
    live: HashSet<Uuid>,
}

/// Peer connector producing placeholder offers
#[derive(Clone, Default)]
pub struct CountingConnector {
    counts: Arc<Mutex<Counts>>,
}

impl CountingConnector {
    pub fn send_only(&self) -> usize {
        self.counts.lock().send_only
    }

    pub fn receive_only(&self) -> usize {
        self.counts.lock().receive_only
    }

    pub fn live(&self) -> usize {
        self.counts.lock().live.len()
    }

    fn offer(&self, direction: PeerDirection) -> PeerOffer {
        let handle = PeerHandle::new(direction);
        self.counts.lock().live.insert(handle.id());
        PeerOffer {
            sdp: format!("v=0\r\ns={}\r\n", handle),
            handle,
        }
    }
}

#[async_trait]
impl PeerConnector for CountingConnector {
    async fn create_send_only(&self, _constraints: &MediaConstraints) -> Result<PeerOffer> {
        self.counts.lock().send_only += 1;
        Ok(self.offer(PeerDirection::SendOnly))
    }

    async fn create_receive_only(&self, _constraints: &MediaConstraints) -> Result<PeerOffer> {
        self.counts.lock().receive_only += 1;
        Ok(self.offer(PeerDirection::ReceiveOnly))
    }

    async fn apply_remote_answer(&self, _handle: &PeerHandle, _sdp_answer: &str) -> Result<()> {
        Ok(())
    }

    async fn dispose(&self, handle: PeerHandle) {
        self.counts.lock().live.remove(&handle.id());
    }
}

/// View that renders nothing and only keeps the chat transcript
#[derive(Clone, Default)]
pub struct SilentView {
    next_tile: Arc<Mutex<u64>>,
    chat: Arc<Mutex<Vec<String>>>,
}

impl SilentView {
    pub fn chat(&self) -> Vec<String> {
        self.chat.lock().clone()
    }
}

impl RoomView for SilentView {
    fn create_tile(&mut self, _name: &str, _is_local_user: bool) -> TileId {
        let mut next = self.next_tile.lock();
        *next += 1;
        TileId::new(*next)
    }

    fn update_tile(&mut self, _tile: TileId, _label: &str) {}

    fn remove_tile(&mut self, _tile: TileId) {}

    fn set_featured(&mut self, _tile: Option<TileId>) {}

    fn append_chat(&mut self, line: &ChatLine) {
        self.chat.lock().push(line.render());
    }

    fn show_roster(&mut self, _entries: &[String]) {}

    fn room_entered(&mut self, _room: &str) {}

    fn room_exited(&mut self) {}
}
