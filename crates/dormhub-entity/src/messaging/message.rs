//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::conversation::{Participant, ParticipantRole};

/// A direct message.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique identifier.
    pub id: Uuid,
    /// Thread.
    pub conversation_id: Uuid,
    /// Sender account.
    pub sender_id: Uuid,
    /// Sender role.
    pub sender_role: ParticipantRole,
    /// Recipient account.
    pub recipient_id: Uuid,
    /// Recipient role.
    pub recipient_role: ParticipantRole,
    /// Text.
    pub content: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When the message was sent.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Compose an unread message.
    pub fn compose(
        conversation_id: Uuid,
        sender: Participant,
        recipient: Participant,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id: sender.id,
            sender_role: sender.role,
            recipient_id: recipient.id,
            recipient_role: recipient.role,
            content,
            is_read: false,
            created_at: now,
        }
    }
}
