use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::Role;
use crate::room::models::MemberInfo;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    CreateRoom,
    JoinRoom,
    Buzz,
    Relaunch,
    Reset,
    LeaveRoom,

    // Server -> Client
    Ack,
    UserConnected,
    UserDisconnected,
    HasBuzzed,
    YouBuzzed,
    Disable,
    Enable,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Correlates a request with its ACK
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WebSocketMessageMeta>,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid payload for {message_type:?}: {reason}")]
    InvalidPayload {
        message_type: MessageType,
        reason: String,
    },

    #[error("{0:?} is not a client command")]
    NotACommand(MessageType),
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub user_name: String,
    pub user_type: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRoomPayload {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Typed inbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    CreateRoom,
    JoinRoom(JoinRoomPayload),
    Buzz,
    Relaunch,
    Reset,
    LeaveRoom(LeaveRoomPayload),
}

impl ClientCommand {
    /// Decodes the typed command carried by an inbound envelope
    pub fn from_message(message: &WebSocketMessage) -> Result<Self, MessageError> {
        let command = match message.message_type {
            MessageType::CreateRoom => ClientCommand::CreateRoom,
            MessageType::JoinRoom => {
                ClientCommand::JoinRoom(Self::parse_payload(message, MessageType::JoinRoom)?)
            }
            MessageType::Buzz => ClientCommand::Buzz,
            MessageType::Relaunch => ClientCommand::Relaunch,
            MessageType::Reset => ClientCommand::Reset,
            MessageType::LeaveRoom => {
                if message.payload.is_null() {
                    ClientCommand::LeaveRoom(LeaveRoomPayload::default())
                } else {
                    ClientCommand::LeaveRoom(Self::parse_payload(message, MessageType::LeaveRoom)?)
                }
            }
            other => return Err(MessageError::NotACommand(other)),
        };
        Ok(command)
    }

    fn parse_payload<T: serde::de::DeserializeOwned>(
        message: &WebSocketMessage,
        message_type: MessageType,
    ) -> Result<T, MessageError> {
        serde_json::from_value(message.payload.clone()).map_err(|e| MessageError::InvalidPayload {
            message_type,
            reason: e.to_string(),
        })
    }
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomAck {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_list: Option<Vec<MemberInfo>>,
}

/// Identifies a member in admin-facing notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPayload {
    pub connection_id: String,
    pub user_name: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            request_id: None,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    fn with_payload<T: Serialize>(
        message_type: MessageType,
        payload: T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(message_type, serde_json::to_value(payload)?))
    }

    pub fn with_request_id(mut self, request_id: Option<u64>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Create an ACK for CREATE_ROOM
    pub fn room_created(
        request_id: Option<u64>,
        room_id: String,
    ) -> Result<Self, serde_json::Error> {
        let message = Self::with_payload(MessageType::Ack, CreateRoomAck { room_id })?;
        Ok(message.with_request_id(request_id))
    }

    /// Create a successful ACK for JOIN_ROOM. `user_list` is only sent to admins.
    pub fn join_succeeded(
        request_id: Option<u64>,
        user_list: Option<Vec<MemberInfo>>,
    ) -> Result<Self, serde_json::Error> {
        let payload = JoinRoomAck {
            success: true,
            error: None,
            user_list,
        };
        Ok(Self::with_payload(MessageType::Ack, payload)?.with_request_id(request_id))
    }

    /// Create a failed ACK for JOIN_ROOM
    pub fn join_failed(
        request_id: Option<u64>,
        error: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        let payload = JoinRoomAck {
            success: false,
            error: Some(error.into()),
            user_list: None,
        };
        Ok(Self::with_payload(MessageType::Ack, payload)?.with_request_id(request_id))
    }

    /// Create a USER_CONNECTED message
    pub fn user_connected(
        connection_id: String,
        user_name: String,
    ) -> Result<Self, serde_json::Error> {
        Self::with_payload(
            MessageType::UserConnected,
            UserPayload {
                connection_id,
                user_name,
            },
        )
    }

    /// Create a USER_DISCONNECTED message
    pub fn user_disconnected(
        connection_id: String,
        user_name: String,
    ) -> Result<Self, serde_json::Error> {
        Self::with_payload(
            MessageType::UserDisconnected,
            UserPayload {
                connection_id,
                user_name,
            },
        )
    }

    /// Create a HAS_BUZZED message
    pub fn has_buzzed(
        connection_id: String,
        user_name: String,
    ) -> Result<Self, serde_json::Error> {
        Self::with_payload(
            MessageType::HasBuzzed,
            UserPayload {
                connection_id,
                user_name,
            },
        )
    }

    pub fn you_buzzed() -> Self {
        Self::new(MessageType::YouBuzzed, serde_json::json!({}))
    }

    pub fn disable() -> Self {
        Self::new(MessageType::Disable, serde_json::json!({}))
    }

    pub fn enable() -> Self {
        Self::new(MessageType::Enable, serde_json::json!({}))
    }
}
