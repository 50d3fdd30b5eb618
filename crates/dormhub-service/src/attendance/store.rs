//! Persistence seams for curfews and daily logs.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use dormhub_core::result::AppResult;
use dormhub_database::repositories::{CurfewRepository, LogRepository};
use dormhub_entity::attendance::{Curfew, Log};

/// Where curfews are kept.
#[async_trait]
pub trait CurfewStore: Send + Sync + std::fmt::Debug {
    /// The most recently set curfew.
    async fn latest(&self) -> AppResult<Option<Curfew>>;
    /// Store a new curfew.
    async fn create(&self, curfew: &Curfew) -> AppResult<Curfew>;
}

/// Where daily logs are kept.
#[async_trait]
pub trait LogStore: Send + Sync + std::fmt::Debug {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Log>>;
    /// A student's log for one local day.
    async fn find_for_day(&self, student_id: Uuid, date: NaiveDate) -> AppResult<Option<Log>>;
    async fn find_by_student(&self, student_id: Uuid, limit: i64) -> AppResult<Vec<Log>>;
    async fn find_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Log>>;
    /// Insert or replace the log for its student and day.
    async fn save(&self, log: &Log) -> AppResult<Log>;
}

#[async_trait]
impl CurfewStore for CurfewRepository {
    async fn latest(&self) -> AppResult<Option<Curfew>> {
        CurfewRepository::latest(self).await
    }

    async fn create(&self, curfew: &Curfew) -> AppResult<Curfew> {
        CurfewRepository::create(self, curfew).await
    }
}

#[async_trait]
impl LogStore for LogRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Log>> {
        LogRepository::find_by_id(self, id).await
    }

    async fn find_for_day(&self, student_id: Uuid, date: NaiveDate) -> AppResult<Option<Log>> {
        LogRepository::find_for_day(self, student_id, date).await
    }

    async fn find_by_student(&self, student_id: Uuid, limit: i64) -> AppResult<Vec<Log>> {
        LogRepository::find_by_student(self, student_id, limit).await
    }

    async fn find_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Log>> {
        LogRepository::find_between(self, from, to).await
    }

    async fn save(&self, log: &Log) -> AppResult<Log> {
        LogRepository::save(self, log).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// In-memory curfews and logs for tests.
    #[derive(Debug, Default)]
    pub struct MemoryAttendance {
        pub curfews: Mutex<Vec<Curfew>>,
        pub logs: Mutex<Vec<Log>>,
    }

    #[async_trait]
    impl CurfewStore for MemoryAttendance {
        async fn latest(&self) -> AppResult<Option<Curfew>> {
            Ok(self.curfews.lock().unwrap().last().cloned())
        }

        async fn create(&self, curfew: &Curfew) -> AppResult<Curfew> {
            self.curfews.lock().unwrap().push(curfew.clone());
            Ok(curfew.clone())
        }
    }

    #[async_trait]
    impl LogStore for MemoryAttendance {
        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Log>> {
            Ok(self.logs.lock().unwrap().iter().find(|l| l.id == id).cloned())
        }

        async fn find_for_day(&self, student_id: Uuid, date: NaiveDate) -> AppResult<Option<Log>> {
            let logs = self.logs.lock().unwrap();
            Ok(logs
                .iter()
                .find(|l| l.student_id == student_id && l.date == date)
                .cloned())
        }

        async fn find_by_student(&self, student_id: Uuid, limit: i64) -> AppResult<Vec<Log>> {
            let logs = self.logs.lock().unwrap();
            Ok(logs
                .iter()
                .filter(|l| l.student_id == student_id)
                .take(usize::try_from(limit).unwrap_or(0))
                .cloned()
                .collect())
        }

        async fn find_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Log>> {
            let logs = self.logs.lock().unwrap();
            Ok(logs
                .iter()
                .filter(|l| l.date >= from && l.date <= to)
                .cloned()
                .collect())
        }

        async fn save(&self, log: &Log) -> AppResult<Log> {
            let mut logs = self.logs.lock().unwrap();
            logs.retain(|l| !(l.student_id == log.student_id && l.date == log.date));
            logs.push(log.clone());
            Ok(log.clone())
        }
    }
}
