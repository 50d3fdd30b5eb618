//! Curfew entity model.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

/// A configured daily cutoff. The most recently created row is in effect.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Curfew {
    /// Unique identifier.
    pub id: Uuid,
    /// Cutoff as `"HH:MM"` in dormitory local time.
    pub time: String,
    /// Admin who set it.
    pub created_by: Uuid,
    /// When it was set.
    pub created_at: DateTime<Utc>,
}

impl Curfew {
    /// Parse a `"HH:MM"` cutoff.
    pub fn parse_time(value: &str) -> AppResult<NaiveTime> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
            AppError::validation(format!(
                "Invalid curfew time '{value}'; expected HH:MM (24-hour)"
            ))
        })
    }

    /// The cutoff as a time of day.
    pub fn time_of_day(&self) -> AppResult<NaiveTime> {
        Self::parse_time(&self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(
            Curfew::parse_time("22:30").unwrap(),
            NaiveTime::from_hms_opt(22, 30, 0).unwrap()
        );
        assert_eq!(
            Curfew::parse_time(" 07:05 ").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 0).unwrap()
        );
        assert!(Curfew::parse_time("25:00").is_err());
        assert!(Curfew::parse_time("10pm").is_err());
    }
}
