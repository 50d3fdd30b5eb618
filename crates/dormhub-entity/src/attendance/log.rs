//! Daily check-in log.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

/// Classification of a check-in or check-out against the curfew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    /// At or before the curfew.
    #[serde(rename = "On Time")]
    OnTime,
    /// After the curfew.
    Late,
    /// Late, but excused by an admin.
    Excused,
}

impl AttendanceStatus {
    /// Compare a timestamp's local time of day with the curfew.
    pub fn classify(at: DateTime<Utc>, curfew: NaiveTime, offset: FixedOffset) -> Self {
        if at.with_timezone(&offset).time() > curfew {
            Self::Late
        } else {
            Self::OnTime
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTime => write!(f, "On Time"),
            Self::Late => write!(f, "Late"),
            Self::Excused => write!(f, "Excused"),
        }
    }
}

/// One check-in and its matching check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Check-in timestamp.
    pub check_in_time: DateTime<Utc>,
    /// Check-out timestamp; absent while the entry is open.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Check-in classification.
    pub check_in_status: AttendanceStatus,
    /// Check-out classification.
    pub check_out_status: Option<AttendanceStatus>,
    /// Admin who excused the entry.
    pub excused_by: Option<Uuid>,
}

impl LogEntry {
    /// Whether the entry still awaits a check-out.
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}

/// A student's log for one local calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Log {
    /// Unique identifier.
    pub id: Uuid,
    /// Student.
    pub student_id: Uuid,
    /// Local calendar day.
    pub date: NaiveDate,
    /// Entries in check-in order.
    #[sqlx(json)]
    pub entries: Vec<LogEntry>,
    /// When the log was created.
    pub created_at: DateTime<Utc>,
    /// When the log was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Log {
    /// Start an empty log for a day.
    pub fn new(student_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            date,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The entry awaiting a check-out, if any.
    pub fn open_entry(&self) -> Option<&LogEntry> {
        self.entries.last().filter(|entry| entry.is_open())
    }

    /// Append a check-in.
    pub fn check_in(
        &mut self,
        at: DateTime<Utc>,
        status: AttendanceStatus,
        max_entries: usize,
    ) -> AppResult<&LogEntry> {
        if self.open_entry().is_some() {
            return Err(AppError::conflict(
                "Already checked in; check out before checking in again",
            ));
        }
        if self.entries.len() >= max_entries {
            return Err(AppError::conflict(format!(
                "Check-in limit reached: {max_entries} per day"
            )));
        }
        self.entries.push(LogEntry {
            check_in_time: at,
            check_out_time: None,
            check_in_status: status,
            check_out_status: None,
            excused_by: None,
        });
        self.updated_at = at;
        self.last_entry()
    }

    /// Close the open entry.
    pub fn check_out(&mut self, at: DateTime<Utc>, status: AttendanceStatus) -> AppResult<&LogEntry> {
        let entry = self
            .entries
            .last_mut()
            .filter(|entry| entry.is_open())
            .ok_or_else(|| AppError::conflict("No open check-in for today"))?;
        entry.check_out_time = Some(at);
        entry.check_out_status = Some(status);
        self.updated_at = at;
        self.last_entry()
    }

    /// Mark the late parts of an entry as excused.
    pub fn excuse(&mut self, index: usize, admin_id: Uuid, now: DateTime<Utc>) -> AppResult<&LogEntry> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| AppError::not_found(format!("Log entry {index} does not exist")))?;
        if entry.check_in_status == AttendanceStatus::Late {
            entry.check_in_status = AttendanceStatus::Excused;
        }
        if entry.check_out_status == Some(AttendanceStatus::Late) {
            entry.check_out_status = Some(AttendanceStatus::Excused);
        }
        entry.excused_by = Some(admin_id);
        self.updated_at = now;
        Ok(&self.entries[index])
    }

    fn last_entry(&self) -> AppResult<&LogEntry> {
        self.entries
            .last()
            .ok_or_else(|| AppError::internal("Log has no entries after update"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn curfew() -> NaiveTime {
        NaiveTime::from_hms_opt(22, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_classify_against_curfew() {
        let early = Utc.with_ymd_and_hms(2024, 3, 1, 21, 59, 0).unwrap();
        let exact = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 22, 1, 0).unwrap();
        assert_eq!(AttendanceStatus::classify(early, curfew(), utc()), AttendanceStatus::OnTime);
        assert_eq!(AttendanceStatus::classify(exact, curfew(), utc()), AttendanceStatus::OnTime);
        assert_eq!(AttendanceStatus::classify(late, curfew(), utc()), AttendanceStatus::Late);
    }

    #[test]
    fn test_classify_uses_local_offset() {
        // 15:30 UTC is 22:30 at UTC+7.
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 30, 0).unwrap();
        let plus7 = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(AttendanceStatus::classify(at, curfew(), plus7), AttendanceStatus::Late);
        assert_eq!(AttendanceStatus::classify(at, curfew(), utc()), AttendanceStatus::OnTime);
    }

    #[test]
    fn test_two_entries_per_day() {
        let now = Utc::now();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        log.check_in(now, AttendanceStatus::OnTime, 2).unwrap();
        assert!(log.check_in(now, AttendanceStatus::OnTime, 2).is_err());
        log.check_out(now, AttendanceStatus::OnTime).unwrap();
        log.check_in(now, AttendanceStatus::Late, 2).unwrap();
        log.check_out(now, AttendanceStatus::Late).unwrap();
        let err = log.check_in(now, AttendanceStatus::OnTime, 2).unwrap_err();
        assert!(err.message.contains("limit"));
        assert_eq!(log.entries.len(), 2);
    }

    #[test]
    fn test_check_out_requires_open_entry() {
        let now = Utc::now();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        assert!(log.check_out(now, AttendanceStatus::OnTime).is_err());
    }

    #[test]
    fn test_excuse_only_changes_late_parts() {
        let now = Utc::now();
        let admin = Uuid::new_v4();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        log.check_in(now, AttendanceStatus::Late, 2).unwrap();
        log.check_out(now, AttendanceStatus::OnTime).unwrap();
        let entry = log.excuse(0, admin, now).unwrap();
        assert_eq!(entry.check_in_status, AttendanceStatus::Excused);
        assert_eq!(entry.check_out_status, Some(AttendanceStatus::OnTime));
        assert_eq!(entry.excused_by, Some(admin));
        assert!(log.excuse(5, admin, now).is_err());
    }
}
