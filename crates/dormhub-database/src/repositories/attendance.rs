//! Curfew and attendance log repositories.

use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_entity::attendance::{Curfew, Log};

/// Repository for curfew settings. The newest row is the active curfew.
#[derive(Debug, Clone)]
pub struct CurfewRepository {
    pool: PgPool,
}

impl CurfewRepository {
    /// Create a new curfew repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The active curfew, if one was ever set.
    pub async fn latest(&self) -> AppResult<Option<Curfew>> {
        sqlx::query_as::<_, Curfew>("SELECT * FROM curfews ORDER BY created_at DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load curfew", e))
    }

    /// Record a new curfew.
    pub async fn create(&self, curfew: &Curfew) -> AppResult<Curfew> {
        sqlx::query_as::<_, Curfew>(
            "INSERT INTO curfews (id, time, created_by, created_at) VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(curfew.id)
        .bind(&curfew.time)
        .bind(curfew.created_by)
        .bind(curfew.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save curfew", e))
    }
}

/// Repository for daily check-in logs.
#[derive(Debug, Clone)]
pub struct LogRepository {
    pool: PgPool,
}

impl LogRepository {
    /// Create a new log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a log by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Log>> {
        sqlx::query_as::<_, Log>("SELECT * FROM logs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find log", e))
    }

    /// Find a student's log for one local calendar day.
    pub async fn find_for_day(&self, student_id: Uuid, date: NaiveDate) -> AppResult<Option<Log>> {
        sqlx::query_as::<_, Log>("SELECT * FROM logs WHERE student_id = $1 AND date = $2")
            .bind(student_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find daily log", e))
    }

    /// List a student's logs, newest day first.
    pub async fn find_by_student(&self, student_id: Uuid, limit: i64) -> AppResult<Vec<Log>> {
        sqlx::query_as::<_, Log>(
            "SELECT * FROM logs WHERE student_id = $1 ORDER BY date DESC LIMIT $2",
        )
        .bind(student_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list logs", e))
    }

    /// List every log within an inclusive date range.
    pub async fn find_between(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Log>> {
        sqlx::query_as::<_, Log>(
            "SELECT * FROM logs WHERE date BETWEEN $1 AND $2 ORDER BY date DESC, student_id",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list logs", e))
    }

    /// Insert or replace a student's log for its day.
    pub async fn save(&self, log: &Log) -> AppResult<Log> {
        sqlx::query_as::<_, Log>(
            "INSERT INTO logs (id, student_id, date, entries, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (student_id, date) DO UPDATE SET entries = $4, updated_at = $6 \
             RETURNING *",
        )
        .bind(log.id)
        .bind(log.student_id)
        .bind(log.date)
        .bind(Json(&log.entries))
        .bind(log.created_at)
        .bind(log.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save log", e))
    }

    /// Count late check-ins or check-outs recorded since a date.
    pub async fn count_late_since(&self, from: NaiveDate) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM logs l, jsonb_array_elements(l.entries) e \
             WHERE l.date >= $1 \
               AND (e->>'check_in_status' = 'Late' OR e->>'check_out_status' = 'Late')",
        )
        .bind(from)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count late entries", e))
    }
}
