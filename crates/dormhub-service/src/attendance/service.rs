//! Check-in and check-out against the current curfew.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::config::AttendanceConfig;
use dormhub_core::result::AppResult;
use dormhub_entity::account::Role;
use dormhub_entity::attendance::{AttendanceStatus, Curfew, Log};

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

use super::store::{CurfewStore, LogStore};

/// How many days of history a student sees.
const STUDENT_HISTORY_DAYS: i64 = 60;

/// The local calendar day `at` falls on.
fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Late movements notify the admin group.
fn late_outcome(log: Log, student_name: &str, check_out: bool) -> Outcome<Log> {
    let late = log.entries.last().is_some_and(|entry| {
        if check_out {
            entry.check_out_status == Some(AttendanceStatus::Late)
        } else {
            entry.check_in_status == AttendanceStatus::Late
        }
    });
    match log.entries.last().filter(|_| late) {
        Some(entry) => {
            let notice =
                rules::late_attendance(student_name, log.student_id, log.date, entry, check_out);
            Outcome::new(log).notify(notice)
        }
        None => Outcome::new(log),
    }
}

/// Records student movements against the curfew.
#[derive(Debug, Clone)]
pub struct AttendanceService {
    /// Curfew persistence.
    curfew_repo: Arc<dyn CurfewStore>,
    /// Log persistence.
    log_repo: Arc<dyn LogStore>,
    /// Side-effect runner.
    effects: Arc<EffectExecutor>,
    /// Local offset and daily limit.
    config: AttendanceConfig,
}

impl AttendanceService {
    /// Creates a new attendance service.
    pub fn new(
        curfew_repo: Arc<dyn CurfewStore>,
        log_repo: Arc<dyn LogStore>,
        effects: Arc<EffectExecutor>,
        config: AttendanceConfig,
    ) -> Self {
        Self {
            curfew_repo,
            log_repo,
            effects,
            config,
        }
    }

    /// The curfew currently in effect.
    pub async fn current_curfew(&self) -> AppResult<Option<Curfew>> {
        self.curfew_repo.latest().await
    }

    /// Sets a new curfew. The previous ones are kept as history.
    pub async fn set_curfew(&self, ctx: &RequestContext, time: &str) -> AppResult<Curfew> {
        ctx.require_role(Role::Admin)?;
        let parsed = Curfew::parse_time(time)?;
        let curfew = Curfew {
            id: Uuid::new_v4(),
            time: parsed.format("%H:%M").to_string(),
            created_by: ctx.user_id,
            created_at: Utc::now(),
        };
        let curfew = self.curfew_repo.create(&curfew).await?;
        info!(curfew = %curfew.time, admin_id = %ctx.user_id, "Curfew set");
        Ok(curfew)
    }

    async fn curfew_time(&self) -> AppResult<NaiveTime> {
        self.curfew_repo
            .latest()
            .await?
            .ok_or_else(|| AppError::validation("No curfew time set"))?
            .time_of_day()
    }

    /// Records a check-in for `student_id`, who must be the caller.
    pub async fn check_in(&self, ctx: &RequestContext, student_id: Uuid) -> AppResult<Log> {
        ctx.require_role(Role::Student)?;
        ctx.require_self(student_id)?;
        let curfew = self.curfew_time().await?;

        let now = Utc::now();
        let offset = self.config.offset();
        let date = local_date(now, offset);
        let mut log = match self.log_repo.find_for_day(student_id, date).await? {
            Some(log) => log,
            None => Log::new(student_id, date, now),
        };

        let status = AttendanceStatus::classify(now, curfew, offset);
        log.check_in(now, status, self.config.max_entries_per_day)?;
        let log = self.log_repo.save(&log).await?;

        info!(student_id = %student_id, date = %date, status = %status, "Checked in");
        Ok(self.effects.apply(late_outcome(log, &ctx.name, false)).await)
    }

    /// Closes the caller's open entry for today.
    pub async fn check_out(&self, ctx: &RequestContext, student_id: Uuid) -> AppResult<Log> {
        ctx.require_role(Role::Student)?;
        ctx.require_self(student_id)?;
        let curfew = self.curfew_time().await?;

        let now = Utc::now();
        let offset = self.config.offset();
        let date = local_date(now, offset);
        let mut log = self
            .log_repo
            .find_for_day(student_id, date)
            .await?
            .ok_or_else(|| AppError::validation("No check-in recorded for today"))?;

        let status = AttendanceStatus::classify(now, curfew, offset);
        log.check_out(now, status)?;
        let log = self.log_repo.save(&log).await?;

        info!(student_id = %student_id, date = %date, status = %status, "Checked out");
        Ok(self.effects.apply(late_outcome(log, &ctx.name, true)).await)
    }

    /// Students see their own recent logs; admins see a date range,
    /// defaulting to the last week.
    pub async fn logs(
        &self,
        ctx: &RequestContext,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> AppResult<Vec<Log>> {
        match ctx.role {
            Role::Student => {
                self.log_repo
                    .find_by_student(ctx.user_id, STUDENT_HISTORY_DAYS)
                    .await
            }
            Role::Admin => {
                let today = local_date(Utc::now(), self.config.offset());
                let to = to.unwrap_or(today);
                let from = from.unwrap_or(to - Duration::days(7));
                if from > to {
                    return Err(AppError::validation("'from' must not be after 'to'"));
                }
                debug!(%from, %to, "Listing logs");
                self.log_repo.find_between(from, to).await
            }
            Role::Staff => Err(AppError::authorization("Staff cannot view check-in logs")),
        }
    }

    /// Excuses one entry of a log.
    pub async fn excuse(&self, ctx: &RequestContext, log_id: Uuid, index: usize) -> AppResult<Log> {
        ctx.require_role(Role::Admin)?;
        let mut log = self
            .log_repo
            .find_by_id(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Log not found"))?;
        log.excuse(index, ctx.user_id, Utc::now())?;
        let log = self.log_repo.save(&log).await?;
        info!(log_id = %log_id, index, admin_id = %ctx.user_id, "Entry excused");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dormhub_entity::notification::{NotificationType, Recipient};

    use dormhub_realtime::DeliveryRegistry;

    use crate::attendance::store::testing::MemoryAttendance;
    use crate::effects::SideEffect;
    use crate::effects::testing::MemoryStore;

    fn service(store: Arc<MemoryAttendance>) -> AttendanceService {
        let effects = EffectExecutor::new(
            Arc::new(MemoryStore::default()),
            Arc::new(DeliveryRegistry::new()),
        );
        AttendanceService::new(
            store.clone(),
            store,
            Arc::new(effects),
            AttendanceConfig::default(),
        )
    }

    fn student(id: Uuid) -> RequestContext {
        RequestContext::new(id, Role::Student, "Alice")
    }

    #[tokio::test]
    async fn test_check_in_without_curfew_creates_no_log() {
        let store = Arc::new(MemoryAttendance::default());
        let attendance = service(store.clone());
        let id = Uuid::new_v4();

        let err = attendance.check_in(&student(id), id).await.unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Validation);
        assert_eq!(err.message, "No curfew time set");
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_in_records_entry_for_today() {
        let store = Arc::new(MemoryAttendance::default());
        let attendance = service(store.clone());
        let admin = RequestContext::new(Uuid::new_v4(), Role::Admin, "Ada");
        attendance.set_curfew(&admin, "22:00").await.unwrap();
        let id = Uuid::new_v4();

        let log = attendance.check_in(&student(id), id).await.unwrap();
        assert_eq!(log.student_id, id);
        assert_eq!(log.entries.len(), 1);
        assert!(log.entries[0].check_out_time.is_none());

        let saved = store.logs.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].date, local_date(Utc::now(), FixedOffset::east_opt(0).unwrap()));
    }

    #[tokio::test]
    async fn test_check_in_for_someone_else_is_refused() {
        let store = Arc::new(MemoryAttendance::default());
        let attendance = service(store.clone());
        let admin = RequestContext::new(Uuid::new_v4(), Role::Admin, "Ada");
        attendance.set_curfew(&admin, "22:00").await.unwrap();

        let result = attendance.check_in(&student(Uuid::new_v4()), Uuid::new_v4()).await;
        assert!(result.is_err());
        assert!(store.logs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_local_date_uses_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 20, 30, 0).unwrap();
        let plus7 = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(local_date(at, plus7), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(local_date(at, utc), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_late_check_in_notifies_admins() {
        let now = Utc::now();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        log.check_in(now, AttendanceStatus::Late, 2).unwrap();

        let outcome = late_outcome(log, "Alice", false);
        assert_eq!(outcome.effects.len(), 1);
        match &outcome.effects[0] {
            SideEffect::Notify(n) => {
                assert_eq!(n.kind, NotificationType::LateCheckIn);
                assert_eq!(n.recipient, Recipient::all_admins());
                assert!(n.content.starts_with("Alice checked in late"));
            }
            other => panic!("unexpected effect {}", other.describe()),
        }
    }

    #[test]
    fn test_on_time_is_silent() {
        let now = Utc::now();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        log.check_in(now, AttendanceStatus::OnTime, 2).unwrap();
        assert!(late_outcome(log.clone(), "Alice", false).effects.is_empty());

        log.check_out(now, AttendanceStatus::OnTime).unwrap();
        assert!(late_outcome(log, "Alice", true).effects.is_empty());
    }

    #[test]
    fn test_late_check_out_after_on_time_check_in() {
        let now = Utc::now();
        let mut log = Log::new(Uuid::new_v4(), now.date_naive(), now);
        log.check_in(now, AttendanceStatus::OnTime, 2).unwrap();
        log.check_out(now, AttendanceStatus::Late).unwrap();

        let outcome = late_outcome(log, "Bob", true);
        assert!(matches!(
            &outcome.effects[..],
            [SideEffect::Notify(n)] if n.kind == NotificationType::LateCheckOut
        ));
    }
}
