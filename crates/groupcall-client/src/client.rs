//! Room client runtime
//!
//! Owns the signaling channel and the [`RoomSession`], and feeds both channel
//! events and user actions to the session from a single loop, so the session
//! is never mutated concurrently.

use crate::config::ClientConfig;
use crate::peer::PeerConnector;
use crate::session::{RoomSession, SessionState};
use crate::signaling::{CommandSink, ServerNotification, SignalingChannel};
use crate::view::RoomView;
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Something the signaling channel reported
#[derive(Debug)]
enum ChannelEvent {
    Notification(ServerNotification),
    Closed,
}

/// Something the local user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Send a chat line
    Chat(String),
    /// Ask the server to flip our visibility
    ToggleVisibility,
    /// Click a participant's tile
    ClickTile(String),
    /// Show who is in the room
    ShowRoster,
    /// Leave the room
    Leave,
}

/// Connected client for one room session
pub struct RoomClient {
    config: ClientConfig,
    channel: Arc<SignalingChannel>,
    session: RoomSession,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl RoomClient {
    /// Validate `config` and connect to its signaling server
    pub async fn connect(
        config: ClientConfig,
        peers: Arc<dyn PeerConnector>,
        view: Box<dyn RoomView>,
    ) -> Result<Self> {
        config.validate()?;

        let channel = Arc::new(SignalingChannel::new(&config.signaling_url));
        let (tx, events) = mpsc::unbounded_channel();

        let message_tx = tx.clone();
        channel.on_message(move |notification| {
            let _ = message_tx.send(ChannelEvent::Notification(notification));
        });
        channel.on_close(move || {
            let _ = tx.send(ChannelEvent::Closed);
        });

        channel.connect().await?;

        let session = RoomSession::new(
            Arc::clone(&channel) as Arc<dyn CommandSink>,
            peers,
            view,
            config.media.clone(),
        );

        Ok(Self {
            config,
            channel,
            session,
            events,
        })
    }

    pub fn session(&self) -> &RoomSession {
        &self.session
    }

    pub fn channel(&self) -> &SignalingChannel {
        &self.channel
    }

    /// Send `joinRoom`
    pub fn join(&mut self, name: &str, room: &str) -> Result<()> {
        self.session.join(name, room)
    }

    /// Drive the session until it reaches [`SessionState::Left`]
    ///
    /// After a leave request the server has `leave_timeout` to confirm the
    /// departure before it is synthesized locally. Returns the finished session.
    pub async fn run(mut self, mut actions: mpsc::UnboundedReceiver<UserAction>) -> RoomSession {
        let mut leave_deadline: Option<Instant> = None;
        let mut actions_open = true;

        while self.session.state() != SessionState::Left {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(ChannelEvent::Notification(notification)) => {
                        self.session.handle(notification).await;
                    }
                    Some(ChannelEvent::Closed) | None => {
                        self.session.handle_channel_closed().await;
                    }
                },
                action = actions.recv(), if actions_open => match action {
                    Some(action) => {
                        if self.apply(action) && leave_deadline.is_none() {
                            leave_deadline = Some(Instant::now() + self.config.leave_timeout());
                        }
                    }
                    None => {
                        debug!("User action stream ended");
                        actions_open = false;
                    }
                },
                _ = wait_until(leave_deadline), if leave_deadline.is_some() => {
                    warn!(
                        timeout = ?self.config.leave_timeout(),
                        "Server did not confirm departure, leaving locally"
                    );
                    let departure = ServerNotification::self_departure(self.session.local_name());
                    self.session.handle(departure).await;
                }
            }
        }

        info!(room = %self.session.room(), "Room client finished");
        self.session
    }

    /// Apply one user action; returns `true` when a leave was requested
    fn apply(&mut self, action: UserAction) -> bool {
        let result = match action {
            UserAction::Chat(text) => self.session.send_chat(&text),
            UserAction::ToggleVisibility => self.session.request_visibility_change(),
            UserAction::ClickTile(name) => self.session.click_tile(&name),
            UserAction::ShowRoster => {
                self.session.show_roster();
                Ok(())
            }
            UserAction::Leave => match self.session.leave() {
                Ok(()) => return true,
                Err(e) => Err(e),
            },
        };

        if let Err(e) = result {
            warn!("Action rejected: {}", e);
        }
        false
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
