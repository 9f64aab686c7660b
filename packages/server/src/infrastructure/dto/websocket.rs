//! WebSocket frame DTOs.
//!
//! Client → server frames are `{ "event": ..., "data": ..., "requestId": ... }` and are
//! parsed into a typed [`ClientCommand`]. Server → client frames are
//! `{ "event": ..., "data": ... }` ([`ServerFrame`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::{DirectMessageDto, GroupMessageDto};

// ========================================
// Client → Server
// ========================================

/// Raw inbound frame before the payload is interpreted
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// A room reference: either a bare string or `{ "roomId": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoomRef {
    Bare(String),
    Object {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

impl RoomRef {
    pub fn into_room_id(self) -> String {
        match self {
            RoomRef::Bare(room_id) | RoomRef::Object { room_id } => room_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticatePayload {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub peer_id: Option<String>,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendDirectPayload {
    #[serde(default)]
    pub to_user_id: Option<String>,
    #[serde(default)]
    pub to_username: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupPayload {
    pub room_id: String,
    pub content: String,
}

/// Typed inbound command processed by the per-connection handler loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Authenticate(AuthenticatePayload),
    JoinGroup { room_id: String },
    LeaveGroup { room_id: String },
    Typing(TypingPayload),
    SendDirect(SendDirectPayload),
    SendGroup(SendGroupPayload),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("invalid payload for '{event}': {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientFrame {
    pub fn into_command(self) -> Result<ClientCommand, FrameError> {
        let event = self.event;
        let data = self.data;

        let parse_error = |source: serde_json::Error| FrameError::InvalidPayload {
            event: event.clone(),
            source,
        };

        let command = match event.as_str() {
            "authenticate" => {
                ClientCommand::Authenticate(serde_json::from_value(data).map_err(parse_error)?)
            }
            "join_group" => ClientCommand::JoinGroup {
                room_id: serde_json::from_value::<RoomRef>(data)
                    .map_err(parse_error)?
                    .into_room_id(),
            },
            "leave_group" => ClientCommand::LeaveGroup {
                room_id: serde_json::from_value::<RoomRef>(data)
                    .map_err(parse_error)?
                    .into_room_id(),
            },
            "typing" => ClientCommand::Typing(serde_json::from_value(data).map_err(parse_error)?),
            "send_direct" => {
                ClientCommand::SendDirect(serde_json::from_value(data).map_err(parse_error)?)
            }
            "send_group" => {
                ClientCommand::SendGroup(serde_json::from_value(data).map_err(parse_error)?)
            }
            _ => return Err(FrameError::UnknownEvent(event)),
        };

        Ok(command)
    }
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReadyPayload {
    pub connection_id: String,
    pub user_id: Option<String>,
    /// Quiet period after which the client should send `typing` with `isTyping: false`
    pub typing_idle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckErrorDto {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    pub request_id: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AckErrorDto>,
}

impl AckPayload {
    pub fn success(request_id: Option<String>) -> Self {
        Self {
            request_id,
            ok: true,
            message: None,
            error: None,
        }
    }

    pub fn with_message(request_id: Option<String>, message: serde_json::Value) -> Self {
        Self {
            request_id,
            ok: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn failure(
        request_id: Option<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id,
            ok: false,
            message: None,
            error: Some(AckErrorDto {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEventDto {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,
    pub is_typing: bool,
}

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    SessionReady(SessionReadyPayload),
    Ack(AckPayload),
    NewDirectMessage(DirectMessageDto),
    NewGroupMessage(GroupMessageDto),
    Typing(TypingEventDto),
}
