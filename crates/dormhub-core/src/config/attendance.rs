//! Curfew and check-in configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Check-in/check-out policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    /// Offset from UTC, in minutes, of the dormitory's local time. Curfew
    /// times and calendar days are evaluated in this offset.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Maximum check-in entries per student per day.
    #[serde(default = "default_max_entries")]
    pub max_entries_per_day: usize,
}

impl AttendanceConfig {
    /// The configured local offset, falling back to UTC when out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            max_entries_per_day: default_max_entries(),
        }
    }
}

fn default_max_entries() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_minutes() {
        let config = AttendanceConfig {
            utc_offset_minutes: 420,
            ..Default::default()
        };
        assert_eq!(config.offset().local_minus_utc(), 7 * 3600);
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let config = AttendanceConfig {
            utc_offset_minutes: 24 * 60,
            ..Default::default()
        };
        assert_eq!(config.offset().local_minus_utc(), 0);
    }
}
