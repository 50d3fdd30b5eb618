//! Staff account and its enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use dormhub_core::AppError;

/// The trade a staff member works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_type", rename_all = "snake_case")]
pub enum StaffType {
    /// Handles maintenance and repair forms.
    Maintenance,
    /// Handles cleaning forms.
    Cleaner,
    /// Security personnel; never assigned forms.
    Security,
}

impl StaffType {
    /// Return the type as its display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::Cleaner => "Cleaner",
            Self::Security => "Security",
        }
    }
}

impl fmt::Display for StaffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StaffType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maintenance" => Ok(Self::Maintenance),
            "cleaner" => Ok(Self::Cleaner),
            "security" => Ok(Self::Security),
            _ => Err(AppError::validation(format!(
                "Invalid staff type: '{s}'. Expected one of: Maintenance, Cleaner, Security"
            ))),
        }
    }
}

/// Availability of a staff member for new assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_status", rename_all = "snake_case")]
pub enum StaffStatus {
    /// Can take new assignments.
    Available,
    /// Temporarily busy.
    Unavailable,
    /// Away on leave.
    #[serde(rename = "On Leave", alias = "OnLeave")]
    OnLeave,
}

impl StaffStatus {
    /// Return the status as its display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Unavailable => "Unavailable",
            Self::OnLeave => "On Leave",
        }
    }
}

impl fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A staff member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Trade.
    pub type_of_staff: StaffType,
    /// Availability.
    pub status: StaffStatus,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Whether the staff member can take a new assignment.
    pub fn is_available(&self) -> bool {
        self.status == StaffStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(
            serde_json::to_string(&StaffStatus::OnLeave).unwrap(),
            "\"On Leave\""
        );
        let parsed: StaffStatus = serde_json::from_str("\"OnLeave\"").unwrap();
        assert_eq!(parsed, StaffStatus::OnLeave);
    }

    #[test]
    fn test_staff_type_from_str() {
        assert_eq!("cleaner".parse::<StaffType>().unwrap(), StaffType::Cleaner);
        assert!("plumber".parse::<StaffType>().is_err());
    }
}
