//! Room management and student placement.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::{BuildingRepository, RoomRepository, StudentRepository};
use dormhub_entity::account::{Role, Student};
use dormhub_entity::building::{Room, RoomChanges, RoomStatus, RoomType};
use dormhub_realtime::{EmitTarget, OutboundEvent};

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};

/// Request to create a room.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    /// Owning building.
    pub building_id: Uuid,
    /// Room number, unique within the building.
    pub room_number: String,
    /// Floor.
    pub floor: i32,
    /// Layout.
    pub room_type: RoomType,
}

/// A room together with the students living in it.
#[derive(Debug, Clone, Serialize)]
pub struct RoomOccupancy {
    /// The room.
    #[serde(flatten)]
    pub room: Room,
    /// Current occupants.
    pub students: Vec<Student>,
}

fn room_update(outcome: Outcome<Room>) -> Outcome<Room> {
    let event = OutboundEvent::RoomUpdate(outcome.value.clone());
    outcome.emit(EmitTarget::Group(Role::Admin), event)
}

/// Manages rooms and who lives in them.
#[derive(Debug, Clone)]
pub struct RoomService {
    /// Room repository.
    room_repo: Arc<RoomRepository>,
    /// Building repository.
    building_repo: Arc<BuildingRepository>,
    /// Student repository.
    student_repo: Arc<StudentRepository>,
    /// Side-effect runner.
    effects: Arc<EffectExecutor>,
}

impl RoomService {
    /// Creates a new room service.
    pub fn new(
        room_repo: Arc<RoomRepository>,
        building_repo: Arc<BuildingRepository>,
        student_repo: Arc<StudentRepository>,
        effects: Arc<EffectExecutor>,
    ) -> Self {
        Self {
            room_repo,
            building_repo,
            student_repo,
            effects,
        }
    }

    /// Gets one room.
    pub async fn get(&self, id: Uuid) -> AppResult<Room> {
        self.room_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Room not found"))
    }

    /// Lists rooms with optional filters.
    pub async fn list(
        &self,
        building_id: Option<Uuid>,
        status: Option<RoomStatus>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Room>> {
        self.room_repo
            .find_all(building_id, status, &page.normalized())
            .await
    }

    /// Lists every room of a building.
    pub async fn list_by_building(&self, building_id: Uuid) -> AppResult<Vec<Room>> {
        if self.building_repo.find_by_id(building_id).await?.is_none() {
            return Err(AppError::not_found("Building not found"));
        }
        self.room_repo.find_by_building(building_id).await
    }

    /// A room with its occupants.
    pub async fn occupancy(&self, id: Uuid) -> AppResult<RoomOccupancy> {
        let room = self.get(id).await?;
        let students = self.student_repo.find_by_room(id).await?;
        Ok(RoomOccupancy { room, students })
    }

    /// The signed-in student's room, if they have one.
    pub async fn my_room(&self, ctx: &RequestContext) -> AppResult<Option<RoomOccupancy>> {
        ctx.require_role(Role::Student)?;
        let student = self
            .student_repo
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))?;
        match student.room_id {
            Some(room_id) => Ok(Some(self.occupancy(room_id).await?)),
            None => Ok(None),
        }
    }

    /// Creates an empty room. Its status is derived, never supplied.
    pub async fn create(&self, ctx: &RequestContext, req: CreateRoomRequest) -> AppResult<Room> {
        let building = self
            .building_repo
            .find_by_id(req.building_id)
            .await?
            .ok_or_else(|| AppError::not_found("Building not found"))?;
        let number = req.room_number.trim().to_string();
        if number.is_empty() {
            return Err(AppError::validation("Room number cannot be empty"));
        }
        if req.floor < 0 || req.floor > building.floors {
            return Err(AppError::validation(format!(
                "Floor must be between 0 and {}",
                building.floors
            )));
        }

        let room = Room::new(building.id, number, req.floor, req.room_type, Utc::now());
        let room = self.room_repo.create(&room).await?;
        info!(room_id = %room.id, building_id = %building.id, admin_id = %ctx.user_id, "Room created");
        Ok(self.effects.apply(room_update(Outcome::new(room))).await)
    }

    /// Updates a room's layout or status. An explicit status wins over
    /// the derived one.
    pub async fn update(&self, id: Uuid, changes: RoomChanges) -> AppResult<Room> {
        let mut room = self.get(id).await?;
        room.apply_changes(changes)?;
        room.updated_at = Utc::now();
        let room = self.room_repo.update(&room).await?;
        Ok(self.effects.apply(room_update(Outcome::new(room))).await)
    }

    /// Deletes an empty room.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let room = self.get(id).await?;
        if !room.occupants.is_empty() {
            return Err(AppError::conflict(format!(
                "Room {} is occupied; move its students out first",
                room.room_number
            )));
        }
        if !self.room_repo.delete(id).await? {
            return Err(AppError::conflict("Room is occupied"));
        }
        info!(room_id = %id, admin_id = %ctx.user_id, "Room deleted");
        Ok(())
    }

    /// Places a student in a room, moving them out of their old one.
    pub async fn assign_student(
        &self,
        ctx: &RequestContext,
        room_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Room> {
        let placement = self
            .room_repo
            .assign_student(room_id, student_id, Utc::now())
            .await?;

        info!(
            room_id = %room_id,
            student_id = %student_id,
            vacated = ?placement.vacated.as_ref().map(|r| r.id),
            admin_id = %ctx.user_id,
            "Student placed"
        );
        let mut outcome = room_update(Outcome::new(placement.room));
        if let Some(old) = placement.vacated {
            outcome = outcome.emit(EmitTarget::Group(Role::Admin), OutboundEvent::RoomUpdate(old));
        }
        Ok(self.effects.apply(outcome).await)
    }

    /// Removes a student from a room.
    pub async fn remove_student(
        &self,
        ctx: &RequestContext,
        room_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Room> {
        let room = self
            .room_repo
            .remove_student(room_id, student_id, Utc::now())
            .await?;
        info!(room_id = %room_id, student_id = %student_id, admin_id = %ctx.user_id, "Student moved out");
        Ok(self.effects.apply(room_update(Outcome::new(room))).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SideEffect;

    #[test]
    fn test_room_update_targets_admins() {
        let room = Room::new(Uuid::new_v4(), "A101".into(), 1, RoomType::Double, Utc::now());
        let outcome = room_update(Outcome::new(room));
        match &outcome.effects[..] {
            [SideEffect::Emit { target, event }] => {
                assert_eq!(*target, EmitTarget::Group(Role::Admin));
                assert_eq!(event.name(), "roomUpdate");
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }
}
