//! JSON wire protocol spoken with the group-call signaling server
//!
//! Every frame is a JSON object whose `id` field names the message kind.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Path of the signaling endpoint on the server
pub const SIGNALING_PATH: &str = "/groupcall";

/// Commands sent from the client to the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Join (or create) a room under a display name
    JoinRoom {
        /// Display name, unique within the room
        name: String,
        /// Room name
        room: String,
    },

    /// Leave the current room
    LeaveRoom,

    /// Offer local video, or request a remote participant's video
    ReceiveVideoFrom {
        /// Participant whose video the offer concerns
        sender: String,
        /// Local SDP offer
        #[serde(rename = "sdpOffer")]
        sdp_offer: String,
    },

    /// Ask the server to flip the named participant's visibility
    ChangeVisibility {
        /// Participant name (always the local user)
        name: String,
    },

    /// Broadcast a chat line to the room
    Chat {
        /// Sender name
        name: String,
        /// Room name
        room: String,
        /// Chat text
        text: String,
    },
}

/// Notifications sent from the server to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "id", rename_all = "camelCase")]
pub enum ServerNotification {
    /// Roster delivered to a newly joined user
    ExistingParticipants(ExistingParticipants),

    /// Another user joined the room
    NewParticipantArrived(ParticipantInfo),

    /// A user left the room
    ParticipantLeft(ParticipantLeft),

    /// SDP answer for an offer previously sent with `receiveVideoFrom`
    ReceiveVideoAnswer(VideoAnswer),

    /// A participant's visibility was flipped
    UpdateVisibility(VisibilityUpdate),

    /// A chat line was distributed to the room
    ChatMessageReceived(ChatMessage),

    /// Any message kind this client does not know about
    #[serde(skip)]
    Unknown {
        /// Raw `id` tag of the message
        kind: String,
    },
}

/// Payload of `existingParticipants`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExistingParticipants {
    /// Whether the joining user is the room admin
    #[serde(default)]
    pub is_new_user_admin: bool,

    /// Whether the joining user starts out visible
    #[serde(default)]
    pub is_new_user_visible: bool,

    /// Everyone else already in the room
    #[serde(default)]
    pub data: Vec<ParticipantInfo>,
}

/// A participant as described by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    /// Participant name
    pub name: String,

    /// Whether the participant is offering video
    #[serde(default)]
    pub is_visible: bool,

    /// Whether the participant administers the room
    #[serde(default)]
    pub is_admin: bool,
}

/// Payload of `participantLeft`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantLeft {
    /// Name of the departed participant
    #[serde(default)]
    pub name: String,

    /// Set when the departure is the local user's own
    #[serde(default, rename = "isyou", alias = "isYou")]
    pub is_you: bool,
}

/// Payload of `receiveVideoAnswer`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnswer {
    /// Participant the answer belongs to
    pub name: String,

    /// Remote SDP answer
    pub sdp_answer: String,
}

/// Payload of `updateVisibility`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisibilityUpdate {
    /// Participant whose visibility changed
    pub user: String,

    /// New visibility
    pub visibility: bool,
}

/// Payload of `chatMessageReceived`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Sender name, absent for system lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Message text
    #[serde(default)]
    pub text: String,

    /// Server-formatted timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Set when the local user sent the line
    #[serde(default)]
    pub is_you: bool,

    /// Set for server-generated lines
    #[serde(default)]
    pub system_message: bool,
}

/// Message kinds that map onto a [`ServerNotification`] variant
const KNOWN_NOTIFICATIONS: &[&str] = &[
    "existingParticipants",
    "newParticipantArrived",
    "participantLeft",
    "receiveVideoAnswer",
    "updateVisibility",
    "chatMessageReceived",
];

impl ClientCommand {
    /// Convert command to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            Error::SerializationError(format!("Failed to serialize client command: {}", e))
        })
    }

    /// Parse command from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::SerializationError(format!("Failed to deserialize client command: {}", e))
        })
    }

    /// Get the wire name of the command
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::JoinRoom { .. } => "joinRoom",
            ClientCommand::LeaveRoom => "leaveRoom",
            ClientCommand::ReceiveVideoFrom { .. } => "receiveVideoFrom",
            ClientCommand::ChangeVisibility { .. } => "changeVisibility",
            ClientCommand::Chat { .. } => "chat",
        }
    }
}

impl ServerNotification {
    /// Parse a received frame
    ///
    /// Frames whose `id` is not a known kind become [`ServerNotification::Unknown`];
    /// anything that is not a JSON object with a string `id`, or whose payload
    /// does not match its kind, is a [`Error::MalformedMessage`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::MalformedMessage(format!("invalid JSON: {}", e)))?;

        let kind = value
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| Error::MalformedMessage("missing string `id` field".to_string()))?;

        if !KNOWN_NOTIFICATIONS.contains(&kind) {
            return Ok(ServerNotification::Unknown {
                kind: kind.to_string(),
            });
        }

        let kind = kind.to_string();
        serde_json::from_value(value)
            .map_err(|e| Error::MalformedMessage(format!("invalid {} payload: {}", kind, e)))
    }

    /// Convert notification to JSON string
    ///
    /// Used by test servers; [`ServerNotification::Unknown`] cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            Error::SerializationError(format!("Failed to serialize notification: {}", e))
        })
    }

    /// Get the wire name of the notification
    pub fn kind(&self) -> &str {
        match self {
            ServerNotification::ExistingParticipants(_) => "existingParticipants",
            ServerNotification::NewParticipantArrived(_) => "newParticipantArrived",
            ServerNotification::ParticipantLeft(_) => "participantLeft",
            ServerNotification::ReceiveVideoAnswer(_) => "receiveVideoAnswer",
            ServerNotification::UpdateVisibility(_) => "updateVisibility",
            ServerNotification::ChatMessageReceived(_) => "chatMessageReceived",
            ServerNotification::Unknown { kind } => kind,
        }
    }

    /// The notification the client synthesizes when it must leave without the server
    pub fn self_departure(name: impl Into<String>) -> Self {
        ServerNotification::ParticipantLeft(ParticipantLeft {
            name: name.into(),
            is_you: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room_wire_format() {
        let cmd = ClientCommand::JoinRoom {
            name: "alice".to_string(),
            room: "lobby".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "joinRoom", "name": "alice", "room": "lobby"})
        );
    }

    #[test]
    fn test_leave_room_wire_format() {
        let json = ClientCommand::LeaveRoom.to_json().unwrap();
        assert_eq!(json, r#"{"id":"leaveRoom"}"#);
        assert_eq!(ClientCommand::from_json(&json).unwrap(), ClientCommand::LeaveRoom);
    }

    #[test]
    fn test_receive_video_from_uses_camel_case_offer() {
        let cmd = ClientCommand::ReceiveVideoFrom {
            sender: "bob".to_string(),
            sdp_offer: "v=0\r\no=- ...".to_string(),
        };

        let value: serde_json::Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();
        assert_eq!(value["id"], "receiveVideoFrom");
        assert_eq!(value["sender"], "bob");
        assert_eq!(value["sdpOffer"], "v=0\r\no=- ...");
        assert_eq!(cmd.kind(), "receiveVideoFrom");
    }

    #[test]
    fn test_parse_existing_participants() {
        let json = r#"{
            "id": "existingParticipants",
            "isNewUserAdmin": true,
            "isNewUserVisible": false,
            "data": [{"name": "bob", "isVisible": true, "isAdmin": false}]
        }"#;

        let parsed = ServerNotification::from_json(json).unwrap();
        let ServerNotification::ExistingParticipants(roster) = parsed else {
            panic!("expected existingParticipants");
        };
        assert!(roster.is_new_user_admin);
        assert!(!roster.is_new_user_visible);
        assert_eq!(roster.data.len(), 1);
        assert_eq!(roster.data[0].name, "bob");
        assert!(roster.data[0].is_visible);
    }

    #[test]
    fn test_participant_left_defaults_is_you() {
        // The reference server only sends the name
        let parsed =
            ServerNotification::from_json(r#"{"id":"participantLeft","name":"bob"}"#).unwrap();
        assert_eq!(
            parsed,
            ServerNotification::ParticipantLeft(ParticipantLeft {
                name: "bob".to_string(),
                is_you: false,
            })
        );
    }

    #[test]
    fn test_participant_left_accepts_both_spellings() {
        let lower = ServerNotification::from_json(
            r#"{"id":"participantLeft","name":"me","isyou":true}"#,
        )
        .unwrap();
        let camel = ServerNotification::from_json(
            r#"{"id":"participantLeft","name":"me","isYou":true}"#,
        )
        .unwrap();
        assert_eq!(lower, ServerNotification::self_departure("me"));
        assert_eq!(camel, ServerNotification::self_departure("me"));
    }

    #[test]
    fn test_chat_message_optional_fields() {
        let parsed = ServerNotification::from_json(
            r#"{"id":"chatMessageReceived","text":"server restarting","systemMessage":true}"#,
        )
        .unwrap();
        let ServerNotification::ChatMessageReceived(msg) = parsed else {
            panic!("expected chatMessageReceived");
        };
        assert_eq!(msg.sender, None);
        assert_eq!(msg.time, None);
        assert!(msg.system_message);
        assert!(!msg.is_you);
    }

    #[test]
    fn test_unknown_kind_is_tolerated() {
        let parsed = ServerNotification::from_json(r#"{"id":"iceCandidate","candidate":{}}"#)
            .unwrap();
        assert_eq!(
            parsed,
            ServerNotification::Unknown {
                kind: "iceCandidate".to_string()
            }
        );
        assert_eq!(parsed.kind(), "iceCandidate");
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(
            ServerNotification::from_json("{not json"),
            Err(Error::MalformedMessage(_))
        ));
        assert!(matches!(
            ServerNotification::from_json(r#"{"name":"bob"}"#),
            Err(Error::MalformedMessage(_))
        ));
        assert!(matches!(
            ServerNotification::from_json(r#"{"id":"receiveVideoAnswer","name":"bob"}"#),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_unknown_cannot_be_serialized() {
        let unknown = ServerNotification::Unknown {
            kind: "ping".to_string(),
        };
        assert!(unknown.to_json().is_err());
    }
}
