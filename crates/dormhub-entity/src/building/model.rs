//! Building entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A dormitory building. Its rooms are found through `rooms.building_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Building {
    /// Unique identifier.
    pub id: Uuid,
    /// Building name (unique).
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// Number of floors.
    pub floors: i32,
    /// When the building was created.
    pub created_at: DateTime<Utc>,
    /// When the building was last updated.
    pub updated_at: DateTime<Utc>,
}
