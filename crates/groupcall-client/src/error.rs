//! Error types for the group-call client

/// Result type alias using the group-call client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while taking part in a group-call room
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command was sent while the signaling channel was not open
    #[error("Signaling channel is closed")]
    ChannelClosed,

    /// A received frame could not be parsed as a notification
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A notification referenced a participant absent from the registry
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// A notification carried a message kind this client does not handle
    #[error("Unrecognized message kind: {0}")]
    UnrecognizedMessageKind(String),

    /// A participant with the same name is already registered
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(String),

    /// Chat text was empty or whitespace only
    #[error("Chat message is empty")]
    EmptyChatMessage,

    /// The operation is not valid in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// WebRTC peer connection error
    #[error("Peer connection error: {0}")]
    PeerConnectionError(String),

    /// SDP negotiation error
    #[error("SDP negotiation error: {0}")]
    SdpError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error should stop the client
    ///
    /// Signaling and negotiation problems degrade a single tile at worst;
    /// only a configuration that cannot be used is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Check if this error comes from the signaling channel
    pub fn is_channel_error(&self) -> bool {
        matches!(
            self,
            Error::ChannelClosed
                | Error::MalformedMessage(_)
                | Error::WebSocketError(_)
                | Error::SerializationError(_)
        )
    }

    /// Check if this error is a peer-related error
    pub fn is_peer_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownParticipant(_)
                | Error::DuplicateParticipant(_)
                | Error::PeerConnectionError(_)
                | Error::SdpError(_)
        )
    }
}
