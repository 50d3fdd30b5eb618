//! Conversation entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

use crate::account::Role;

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_role", rename_all = "snake_case")]
pub enum ParticipantRole {
    /// A student.
    User,
    /// An administrator.
    Admin,
}

impl ParticipantRole {
    /// Map an account role; staff cannot take part in conversations.
    pub fn from_role(role: Role) -> AppResult<Self> {
        match role {
            Role::Student => Ok(Self::User),
            Role::Admin => Ok(Self::Admin),
            Role::Staff => Err(AppError::authorization(
                "Staff accounts cannot send direct messages",
            )),
        }
    }
}

impl From<ParticipantRole> for Role {
    fn from(role: ParticipantRole) -> Self {
        match role {
            ParticipantRole::User => Role::Student,
            ParticipantRole::Admin => Role::Admin,
        }
    }
}

/// One side of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Account id.
    pub id: Uuid,
    /// Account role.
    pub role: ParticipantRole,
}

/// A two-party message thread.
///
/// `unread_counts` is a denormalized per-participant counter, incremented
/// on send and zeroed when the participant fetches the thread.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Unique identifier.
    pub id: Uuid,
    /// Ordered participants.
    #[sqlx(json)]
    pub participants: Vec<Participant>,
    /// Most recent message.
    pub last_message_id: Option<Uuid>,
    /// Unread messages per participant id.
    #[sqlx(json)]
    pub unread_counts: HashMap<Uuid, i64>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation last changed.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Start a conversation between two participants.
    pub fn between(a: Participant, b: Participant, now: DateTime<Utc>) -> AppResult<Self> {
        if a.id == b.id {
            return Err(AppError::validation("Cannot start a conversation with yourself"));
        }
        if a.role == b.role {
            return Err(AppError::validation(
                "Conversations are between a student and an admin",
            ));
        }
        let unread_counts = [(a.id, 0), (b.id, 0)].into_iter().collect();
        Ok(Self {
            id: Uuid::new_v4(),
            participants: vec![a, b],
            last_message_id: None,
            unread_counts,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the account takes part.
    pub fn has_participant(&self, id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == id)
    }

    /// The other participant.
    pub fn counterpart(&self, id: Uuid) -> Option<Participant> {
        self.participants.iter().copied().find(|p| p.id != id)
    }

    /// Unread count for a participant.
    pub fn unread_for(&self, id: Uuid) -> i64 {
        self.unread_counts.get(&id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_student_and_admin() {
        let s = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::User,
        };
        let a = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::Admin,
        };
        let c = Conversation::between(s, a, Utc::now()).unwrap();
        assert!(c.has_participant(s.id));
        assert_eq!(c.counterpart(s.id), Some(a));
        assert_eq!(c.unread_for(a.id), 0);
    }

    #[test]
    fn test_same_role_rejected() {
        let s1 = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::User,
        };
        let s2 = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::User,
        };
        assert!(Conversation::between(s1, s2, Utc::now()).is_err());
    }

    #[test]
    fn test_unread_counts_serialize_as_object() {
        let s = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::User,
        };
        let a = Participant {
            id: Uuid::new_v4(),
            role: ParticipantRole::Admin,
        };
        let c = Conversation::between(s, a, Utc::now()).unwrap();
        let json = serde_json::to_value(&c.unread_counts).unwrap();
        assert!(json.get(s.id.to_string()).is_some());
    }

    #[test]
    fn test_staff_cannot_message() {
        assert!(ParticipantRole::from_role(Role::Staff).is_err());
    }
}
