//! Student account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A resident student.
///
/// `room_id` and `building_id` mirror the owning room's occupant set and
/// are written only together with it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    /// Unique identifier.
    pub id: Uuid,
    /// School-issued student number (unique).
    pub student_number: String,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Gender, free text.
    pub gender: Option<String>,
    /// Current room, if housed.
    pub room_id: Option<Uuid>,
    /// Building of the current room, if housed.
    pub building_id: Option<Uuid>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
