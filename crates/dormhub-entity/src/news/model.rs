//! News entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An announcement published by an admin.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct News {
    /// Unique identifier.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Body.
    pub content: String,
    /// Stored image path.
    pub image_path: Option<String>,
    /// Publishing admin.
    pub author_id: Uuid,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last edited.
    pub updated_at: DateTime<Utc>,
}
