//! Building management.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_database::repositories::BuildingRepository;
use dormhub_entity::building::Building;

use crate::context::RequestContext;

/// Request to create or replace a building's details.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingRequest {
    /// Building name (unique).
    pub name: String,
    /// Street address.
    pub address: Option<String>,
    /// Number of floors.
    pub floors: i32,
}

impl BuildingRequest {
    fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Building name cannot be empty"));
        }
        if self.floors < 1 {
            return Err(AppError::validation("A building has at least one floor"));
        }
        Ok(())
    }
}

/// Manages dormitory buildings.
#[derive(Debug, Clone)]
pub struct BuildingService {
    /// Building repository.
    building_repo: Arc<BuildingRepository>,
}

impl BuildingService {
    /// Creates a new building service.
    pub fn new(building_repo: Arc<BuildingRepository>) -> Self {
        Self { building_repo }
    }

    /// Lists all buildings.
    pub async fn list(&self) -> AppResult<Vec<Building>> {
        self.building_repo.find_all().await
    }

    /// Gets one building.
    pub async fn get(&self, id: Uuid) -> AppResult<Building> {
        self.building_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Building not found"))
    }

    /// Creates a building.
    pub async fn create(&self, ctx: &RequestContext, req: BuildingRequest) -> AppResult<Building> {
        req.validate()?;
        let now = Utc::now();
        let building = Building {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            address: req.address,
            floors: req.floors,
            created_at: now,
            updated_at: now,
        };
        let building = self.building_repo.create(&building).await?;
        info!(building_id = %building.id, admin_id = %ctx.user_id, "Building created");
        Ok(building)
    }

    /// Replaces a building's details.
    pub async fn update(&self, id: Uuid, req: BuildingRequest) -> AppResult<Building> {
        req.validate()?;
        let mut building = self.get(id).await?;
        building.name = req.name.trim().to_string();
        building.address = req.address;
        building.floors = req.floors;
        building.updated_at = Utc::now();
        self.building_repo.update(&building).await
    }

    /// Deletes a building that owns no rooms.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        self.get(id).await?;
        let rooms = self.building_repo.count_rooms(id).await?;
        if rooms > 0 {
            return Err(AppError::conflict(format!(
                "Building still has {rooms} rooms; delete them first"
            )));
        }
        self.building_repo.delete(id).await?;
        info!(building_id = %id, admin_id = %ctx.user_id, "Building deleted");
        Ok(())
    }
}
