//! Aggregate queries for the admin dashboard.

use serde::Serialize;
use sqlx::PgPool;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct OverviewCounts {
    /// Registered students.
    pub students: i64,
    /// Students currently placed in a room.
    pub housed_students: i64,
    /// Staff accounts.
    pub staff: i64,
    /// Buildings.
    pub buildings: i64,
    /// Rooms.
    pub rooms: i64,
    /// Total beds across all rooms.
    pub beds: i64,
    /// Beds currently taken.
    pub occupied_beds: i64,
    /// Forms not yet completed or rejected.
    pub open_forms: i64,
}

/// Repository for cross-table statistics.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    /// Create a new analytics repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Compute the dashboard headline counts in one round trip.
    pub async fn overview(&self) -> AppResult<OverviewCounts> {
        sqlx::query_as::<_, OverviewCounts>(
            "SELECT \
               (SELECT COUNT(*) FROM students) AS students, \
               (SELECT COUNT(*) FROM students WHERE room_id IS NOT NULL) AS housed_students, \
               (SELECT COUNT(*) FROM staff) AS staff, \
               (SELECT COUNT(*) FROM buildings) AS buildings, \
               (SELECT COUNT(*) FROM rooms) AS rooms, \
               (SELECT COALESCE(SUM(CASE room_type WHEN 'single' THEN 1 ELSE 2 END), 0) \
                  FROM rooms)::bigint AS beds, \
               (SELECT COALESCE(SUM(cardinality(occupants)), 0) FROM rooms)::bigint AS occupied_beds, \
               (SELECT COUNT(*) FROM forms WHERE status NOT IN ('completed', 'rejected')) \
                  AS open_forms",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to compute overview", e))
    }
}
