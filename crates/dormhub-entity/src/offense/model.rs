//! Offense entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A rule violation recorded against a student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Offense {
    /// Unique identifier.
    pub id: Uuid,
    /// Offending student.
    pub student_id: Uuid,
    /// Category, e.g. "Noise".
    pub offense_type: String,
    /// Details.
    pub description: String,
    /// Day it happened.
    pub occurred_on: NaiveDate,
    /// Recording admin.
    pub recorded_by: Uuid,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}
