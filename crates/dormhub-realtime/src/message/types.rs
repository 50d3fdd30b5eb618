//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dormhub_entity::account::Role;
use dormhub_entity::building::Room;
use dormhub_entity::form::FormStatus;
use dormhub_entity::messaging::Message;
use dormhub_entity::notification::Notification;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Bind the socket to an account id. Must match the session.
    Join {
        /// Account id.
        user_id: Uuid,
    },
    /// Join a role group for broadcasts.
    JoinUserType {
        /// Role group name.
        user_type: Role,
    },
    /// Client keepalive.
    Ping,
    /// Reply to a server ping.
    Pong,
}

/// Events sent by the server to the client, framed as
/// `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// A notification addressed to this account.
    NewNotification(Notification),
    /// A direct message addressed to this account.
    NewMessage(Message),
    /// A form changed status.
    FormStatusChanged {
        /// Form id.
        form_id: Uuid,
        /// Submitting student.
        student_id: Uuid,
        /// Status before the change.
        previous_status: Option<FormStatus>,
        /// Status after the change.
        status: FormStatus,
        /// When it happened.
        updated_at: DateTime<Utc>,
    },
    /// A room's occupancy changed.
    RoomUpdate(Room),
    /// Acknowledges `join` / `join_user_type`.
    Joined {
        /// Account id.
        user_id: Uuid,
        /// Role group joined.
        role: Role,
    },
    /// Reply to a client ping.
    Pong {
        /// Server time in milliseconds.
        timestamp: i64,
    },
    /// Server keepalive.
    Ping {
        /// Server time in milliseconds.
        timestamp: i64,
    },
    /// A refused or malformed inbound frame.
    Error {
        /// Human readable reason.
        message: String,
    },
}

impl OutboundEvent {
    /// Event name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewNotification(_) => "newNotification",
            Self::NewMessage(_) => "newMessage",
            Self::FormStatusChanged { .. } => "formStatusChanged",
            Self::RoomUpdate(_) => "roomUpdate",
            Self::Joined { .. } => "joined",
            Self::Pong { .. } => "pong",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }

    /// Build an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Where a non-notification event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitTarget {
    /// One account's live connection.
    User(Uuid),
    /// Every member of a role group.
    Group(Role),
}
