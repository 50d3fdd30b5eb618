//! Offense repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_entity::offense::Offense;

/// Repository for disciplinary records.
#[derive(Debug, Clone)]
pub struct OffenseRepository {
    pool: PgPool,
}

impl OffenseRepository {
    /// Create a new offense repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List offenses, optionally for one student, newest first.
    pub async fn find_all(&self, student_id: Option<Uuid>) -> AppResult<Vec<Offense>> {
        sqlx::query_as::<_, Offense>(
            "SELECT * FROM offenses WHERE ($1::uuid IS NULL OR student_id = $1) \
             ORDER BY occurred_on DESC, created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list offenses", e))
    }

    /// Insert an offense.
    pub async fn create(&self, offense: &Offense) -> AppResult<Offense> {
        sqlx::query_as::<_, Offense>(
            "INSERT INTO offenses (id, student_id, offense_type, description, occurred_on, \
             recorded_by, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(offense.id)
        .bind(offense.student_id)
        .bind(&offense.offense_type)
        .bind(&offense.description)
        .bind(offense.occurred_on)
        .bind(offense.recorded_by)
        .bind(offense.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record offense", e))
    }

    /// Delete an offense.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM offenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete offense", e))?;
        Ok(result.rows_affected() > 0)
    }
}
