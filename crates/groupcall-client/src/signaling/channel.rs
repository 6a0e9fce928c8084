//! WebSocket signaling channel
//!
//! A thin message pump: outgoing commands are serialized and queued to a
//! writer task, incoming frames are parsed by a reader task and handed to the
//! registered message handler one at a time, in arrival order.

use super::protocol::{ClientCommand, ServerNotification};
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Callback invoked once per received notification
pub type MessageHandler = Arc<dyn Fn(ServerNotification) + Send + Sync>;

/// Callback invoked when the transport closes underneath the channel
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// Lifecycle of a signaling channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, `connect` not yet completed
    Idle,
    /// Connected; commands can be sent
    Open,
    /// Closed explicitly, by the transport, or by a failed send
    Closed,
}

/// Outgoing side of the signaling channel as seen by the room session
pub trait CommandSink: Send + Sync {
    /// Serialize and transmit a command
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is not open.
    fn send(&self, command: &ClientCommand) -> Result<()>;

    /// Close the channel; calling it again has no effect
    fn close(&self);
}

#[derive(Default)]
struct ChannelHandlers {
    on_message: Mutex<Option<MessageHandler>>,
    on_close: Mutex<Option<CloseHandler>>,
}

impl ChannelHandlers {
    fn dispatch(&self, notification: ServerNotification) {
        let handler = self.on_message.lock().clone();
        match handler {
            Some(handler) => handler(notification),
            None => debug!(kind = notification.kind(), "No message handler registered, dropping"),
        }
    }

    fn closed(&self) {
        let handler = self.on_close.lock().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Parse one text frame and dispatch it; malformed frames are logged and dropped
    fn dispatch_frame(&self, text: &str) {
        debug!("Received signaling message: {}", text);

        match ServerNotification::from_json(text) {
            Ok(notification) => self.dispatch(notification),
            Err(e) => warn!("Dropping signaling frame: {}", e),
        }
    }
}

/// WebSocket signaling channel to the group-call server
pub struct SignalingChannel {
    /// Signaling server URL
    url: String,

    /// Outgoing frame sender, present while the writer task runs
    tx: Mutex<Option<mpsc::UnboundedSender<Message>>>,

    /// Current channel state
    state: Arc<Mutex<ChannelState>>,

    /// Registered callbacks
    handlers: Arc<ChannelHandlers>,

    /// Reader and writer tasks
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SignalingChannel {
    /// Create a new, unconnected signaling channel
    ///
    /// # Arguments
    ///
    /// * `url` - WebSocket signaling endpoint (ws:// or wss://)
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            tx: Mutex::new(None),
            state: Arc::new(Mutex::new(ChannelState::Idle)),
            handlers: Arc::new(ChannelHandlers::default()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Signaling server URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current channel state
    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    /// Whether commands can currently be sent
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Register the single dispatch callback for received notifications
    ///
    /// Replaces any previously registered handler.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(ServerNotification) + Send + Sync + 'static,
    {
        *self.handlers.on_message.lock() = Some(Arc::new(handler));
    }

    /// Register the callback invoked when the transport closes
    ///
    /// Not invoked for an explicit [`SignalingChannel::close`].
    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.handlers.on_close.lock() = Some(Arc::new(handler));
    }

    /// Connect to the signaling server
    ///
    /// Establishes the WebSocket connection and starts the background tasks
    /// that send and receive frames.
    pub async fn connect(&self) -> Result<()> {
        if self.state() != ChannelState::Idle {
            return Err(Error::InvalidState(format!(
                "channel to {} cannot be connected twice",
                self.url
            )));
        }

        info!("Connecting to signaling server: {}", self.url);

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocketError(format!("Failed to connect: {}", e)))?;

        info!("Connected to signaling server");

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        *self.tx.lock() = Some(tx);
        *self.state.lock() = ChannelState::Open;

        let writer = tokio::spawn(Self::sender_task(write, rx));
        let reader = tokio::spawn(Self::receiver_task(
            read,
            Arc::clone(&self.state),
            Arc::clone(&self.handlers),
        ));

        self.tasks.lock().extend([writer, reader]);

        Ok(())
    }

    /// Sender task: sends frames from the queue to the WebSocket
    async fn sender_task(
        mut write: futures::stream::SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
    ) {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write.send(msg).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }

        debug!("Sender task terminated");
    }

    /// Receiver task: parses frames and dispatches them in order
    async fn receiver_task(
        mut read: futures::stream::SplitStream<WsStream>,
        state: Arc<Mutex<ChannelState>>,
        handlers: Arc<ChannelHandlers>,
    ) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => handlers.dispatch_frame(&text),
                Ok(Message::Close(_)) => {
                    info!("WebSocket connection closed by server");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        let was_open = {
            let mut state = state.lock();
            let was_open = *state == ChannelState::Open;
            *state = ChannelState::Closed;
            was_open
        };

        if was_open {
            handlers.closed();
        }

        debug!("Receiver task terminated");
    }

    /// Mark the channel closed after a failed send and report our own departure
    fn fail_send(&self) -> Error {
        *self.state.lock() = ChannelState::Closed;
        self.tx.lock().take();

        warn!("Send attempted on closed signaling channel, synthesizing self-departure");
        self.handlers.dispatch(ServerNotification::self_departure(String::new()));

        Error::ChannelClosed
    }
}

impl CommandSink for SignalingChannel {
    fn send(&self, command: &ClientCommand) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail_send());
        }

        let json = command.to_json()?;
        debug!("Sending signaling message: {}", json);

        let sent = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Message::Text(json)).is_ok(),
            None => false,
        };

        if sent {
            Ok(())
        } else {
            Err(self.fail_send())
        }
    }

    fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == ChannelState::Closed && self.tasks.lock().is_empty() {
                return;
            }
            *state = ChannelState::Closed;
        }

        self.tx.lock().take();
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }

        info!("Signaling channel to {} closed", self.url);
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
