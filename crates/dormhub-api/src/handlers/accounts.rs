//! Admin management of student and staff accounts.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::account::{Staff, Student};
use dormhub_service::account::admin::{
    CreateStaffRequest, CreateStudentRequest, UpdateStaffRequest,
};
use dormhub_service::account::profile::UpdateProfileRequest;

use crate::dto::request::{StaffQuery, StudentQuery};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

// ── Students ─────────────────────────────────────────────────────

/// GET /api/admin/students
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Student>>>, ApiError> {
    let page = state
        .account_admin_service
        .list_students(query.search.as_deref(), params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/admin/students/{id}
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Student>>, ApiError> {
    let student = state.account_admin_service.get_student(id).await?;
    Ok(Json(ApiResponse::ok(student)))
}

/// POST /api/admin/students
pub async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateStudentRequest>,
) -> Result<Json<ApiResponse<Student>>, ApiError> {
    let student = state.account_admin_service.create_student(&auth, req).await?;
    Ok(Json(ApiResponse::ok(student)))
}

/// PUT /api/admin/students/{id}
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<Student>>, ApiError> {
    let student = state.account_admin_service.update_student(id, req).await?;
    Ok(Json(ApiResponse::ok(student)))
}

/// DELETE /api/admin/students/{id}
pub async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.account_admin_service.delete_student(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Student deleted"))))
}

// ── Staff ────────────────────────────────────────────────────────

/// GET /api/admin/staff
pub async fn list_staff(
    State(state): State<AppState>,
    Query(query): Query<StaffQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Staff>>>, ApiError> {
    let page = state
        .account_admin_service
        .list_staff(&query.into(), params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/admin/staff/{id}
pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Staff>>, ApiError> {
    let staff = state.account_admin_service.get_staff(id).await?;
    Ok(Json(ApiResponse::ok(staff)))
}

/// POST /api/admin/staff
pub async fn create_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateStaffRequest>,
) -> Result<Json<ApiResponse<Staff>>, ApiError> {
    let staff = state.account_admin_service.create_staff(&auth, req).await?;
    Ok(Json(ApiResponse::ok(staff)))
}

/// PUT /api/admin/staff/{id}
pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<Json<ApiResponse<Staff>>, ApiError> {
    let staff = state.account_admin_service.update_staff(id, req).await?;
    Ok(Json(ApiResponse::ok(staff)))
}

/// DELETE /api/admin/staff/{id}
pub async fn delete_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.account_admin_service.delete_staff(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Staff member deleted"))))
}
