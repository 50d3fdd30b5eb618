//! Building, room and occupant handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::building::{Building, Room, RoomChanges};
use dormhub_service::housing::building::BuildingRequest;
use dormhub_service::housing::room::{CreateRoomRequest, RoomOccupancy};

use crate::dto::request::{OccupantRequest, RoomQuery};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

// ── Buildings ────────────────────────────────────────────────────

/// GET /api/admin/buildings
pub async fn list_buildings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Building>>>, ApiError> {
    let buildings = state.building_service.list().await?;
    Ok(Json(ApiResponse::ok(buildings)))
}

/// GET /api/admin/buildings/{id}
pub async fn get_building(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Building>>, ApiError> {
    let building = state.building_service.get(id).await?;
    Ok(Json(ApiResponse::ok(building)))
}

/// POST /api/admin/buildings
pub async fn create_building(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<BuildingRequest>,
) -> Result<Json<ApiResponse<Building>>, ApiError> {
    let building = state.building_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(building)))
}

/// PUT /api/admin/buildings/{id}
pub async fn update_building(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<BuildingRequest>,
) -> Result<Json<ApiResponse<Building>>, ApiError> {
    let building = state.building_service.update(id, req).await?;
    Ok(Json(ApiResponse::ok(building)))
}

/// DELETE /api/admin/buildings/{id}
pub async fn delete_building(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.building_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Building deleted"))))
}

/// GET /api/admin/buildings/{id}/rooms
pub async fn list_building_rooms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Room>>>, ApiError> {
    let rooms = state.room_service.list_by_building(id).await?;
    Ok(Json(ApiResponse::ok(rooms)))
}

// ── Rooms ────────────────────────────────────────────────────────

/// GET /api/admin/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Room>>>, ApiError> {
    let rooms = state
        .room_service
        .list(query.building_id, query.status, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(rooms)))
}

/// GET /api/admin/rooms/{id}
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RoomOccupancy>>, ApiError> {
    let room = state.room_service.occupancy(id).await?;
    Ok(Json(ApiResponse::ok(room)))
}

/// POST /api/admin/rooms
pub async fn create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<ApiResponse<Room>>, ApiError> {
    let room = state.room_service.create(&auth, req).await?;
    Ok(Json(ApiResponse::ok(room)))
}

/// PUT /api/admin/rooms/{id}
pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<RoomChanges>,
) -> Result<Json<ApiResponse<Room>>, ApiError> {
    let room = state.room_service.update(id, changes).await?;
    Ok(Json(ApiResponse::ok(room)))
}

/// DELETE /api/admin/rooms/{id}
pub async fn delete_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.room_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Room deleted"))))
}

/// POST /api/admin/rooms/{id}/occupants
pub async fn add_occupant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OccupantRequest>,
) -> Result<Json<ApiResponse<Room>>, ApiError> {
    let room = state
        .room_service
        .assign_student(&auth, id, req.student_id)
        .await?;
    Ok(Json(ApiResponse::ok(room)))
}

/// DELETE /api/admin/rooms/{id}/occupants/{student_id}
pub async fn remove_occupant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Room>>, ApiError> {
    let room = state
        .room_service
        .remove_student(&auth, id, student_id)
        .await?;
    Ok(Json(ApiResponse::ok(room)))
}

/// GET /api/students/room
pub async fn my_room(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Option<RoomOccupancy>>>, ApiError> {
    let room = state.room_service.my_room(&auth).await?;
    Ok(Json(ApiResponse::ok(room)))
}
