//! Mock group-call signaling server
//!
//! Accepts a single WebSocket client, records every command it sends and
//! writes whatever notifications the test pushes.

use super::{HarnessError, HarnessResult, WAIT};
use futures::{SinkExt, StreamExt};
use groupcall_client::signaling::protocol::SIGNALING_PATH;
use groupcall_client::{ClientCommand, ServerNotification};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

enum ServerFrame {
    Text(String),
    Close,
}

/// Embedded signaling server for one client connection
pub struct MockServer {
    /// Server address (127.0.0.1:port)
    addr: SocketAddr,

    /// Frames to write to the client
    outgoing: mpsc::UnboundedSender<ServerFrame>,

    /// Commands received from the client, in arrival order
    commands: mpsc::UnboundedReceiver<ClientCommand>,

    /// Connection task
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Start a server on a random available port
    pub async fn start() -> HarnessResult<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| HarnessError::ServerError(format!("Failed to bind: {}", e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| HarnessError::ServerError(format!("Failed to get local addr: {}", e)))?;

        info!("Mock server listening on {}", addr);

        let (outgoing, out_rx) = mpsc::unbounded_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();

        let handle = tokio::spawn(Self::serve(listener, out_rx, command_tx));

        Ok(Self {
            addr,
            outgoing,
            commands,
            handle,
        })
    }

    async fn serve(
        listener: TcpListener,
        mut out_rx: mpsc::UnboundedReceiver<ServerFrame>,
        command_tx: mpsc::UnboundedSender<ClientCommand>,
    ) {
        let stream = match listener.accept().await {
            Ok((stream, peer)) => {
                info!("Mock server accepted {}", peer);
                stream
            }
            Err(e) => {
                error!("Mock server accept failed: {}", e);
                return;
            }
        };

        let ws = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws.split();

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => match ClientCommand::from_json(&text) {
                        Ok(command) => {
                            let _ = command_tx.send(command);
                        }
                        Err(e) => warn!("Mock server got unparseable command: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                out = out_rx.recv() => match out {
                    Some(ServerFrame::Text(text)) => {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(ServerFrame::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                },
            }
        }

        info!("Mock server connection finished");
    }

    /// WebSocket URL of the signaling endpoint
    pub fn url(&self) -> String {
        format!("ws://{}{}", self.addr, SIGNALING_PATH)
    }

    /// Wait for the next command from the client
    pub async fn next_command(&mut self) -> HarnessResult<ClientCommand> {
        match tokio::time::timeout(WAIT, self.commands.recv()).await {
            Ok(Some(command)) => Ok(command),
            Ok(None) => Err(HarnessError::ConnectionError(
                "client connection finished".to_string(),
            )),
            Err(_) => Err(HarnessError::Timeout("no command received".to_string())),
        }
    }

    /// Send a notification to the client
    pub fn push(&self, notification: &ServerNotification) -> HarnessResult<()> {
        let text = notification
            .to_json()
            .map_err(|e| HarnessError::ServerError(e.to_string()))?;
        self.push_raw(&text)
    }

    /// Send an arbitrary text frame to the client
    pub fn push_raw(&self, text: &str) -> HarnessResult<()> {
        self.outgoing
            .send(ServerFrame::Text(text.to_string()))
            .map_err(|_| HarnessError::ServerError("connection task finished".to_string()))
    }

    /// Close the connection from the server side
    pub fn close(&self) {
        let _ = self.outgoing.send(ServerFrame::Close);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
