//! Building repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_entity::building::Building;

use super::db_error;

/// Repository for buildings.
#[derive(Debug, Clone)]
pub struct BuildingRepository {
    pool: PgPool,
}

impl BuildingRepository {
    /// Create a new building repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a building by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Building>> {
        sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find building", e))
    }

    /// List all buildings by name.
    pub async fn find_all(&self) -> AppResult<Vec<Building>> {
        sqlx::query_as::<_, Building>("SELECT * FROM buildings ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list buildings", e))
    }

    /// Insert a building.
    pub async fn create(&self, building: &Building) -> AppResult<Building> {
        sqlx::query_as::<_, Building>(
            "INSERT INTO buildings (id, name, address, floors, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(building.id)
        .bind(&building.name)
        .bind(&building.address)
        .bind(building.floors)
        .bind(building.created_at)
        .bind(building.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create building"))
    }

    /// Persist building changes.
    pub async fn update(&self, building: &Building) -> AppResult<Building> {
        sqlx::query_as::<_, Building>(
            "UPDATE buildings SET name = $2, address = $3, floors = $4, updated_at = $5 \
             WHERE id = $1 RETURNING *",
        )
        .bind(building.id)
        .bind(&building.name)
        .bind(&building.address)
        .bind(building.floors)
        .bind(building.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to update building"))
    }

    /// Count the rooms in a building.
    pub async fn count_rooms(&self, id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE building_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count building rooms", e)
            })
    }

    /// Delete a building. Callers must check that it has no rooms first.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM buildings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete building", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
