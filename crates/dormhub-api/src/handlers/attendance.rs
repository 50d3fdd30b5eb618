//! Curfew and check-in handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use dormhub_entity::attendance::{Curfew, Log};

use crate::dto::request::{CurfewRequest, LogQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/students/{id}/check-in
pub async fn check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Log>>, ApiError> {
    let log = state.attendance_service.check_in(&auth, student_id).await?;
    Ok(Json(ApiResponse::ok(log)))
}

/// POST /api/students/{id}/check-out
pub async fn check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Log>>, ApiError> {
    let log = state.attendance_service.check_out(&auth, student_id).await?;
    Ok(Json(ApiResponse::ok(log)))
}

/// GET /api/{students|admin}/logs
pub async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<Log>>>, ApiError> {
    let logs = state
        .attendance_service
        .logs(&auth, query.from, query.to)
        .await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// PUT /api/admin/logs/{id}/entries/{index}/excuse
pub async fn excuse_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((log_id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ApiResponse<Log>>, ApiError> {
    let log = state.attendance_service.excuse(&auth, log_id, index).await?;
    Ok(Json(ApiResponse::ok(log)))
}

/// GET /api/{students|admin}/curfew
pub async fn get_curfew(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<Curfew>>>, ApiError> {
    let curfew = state.attendance_service.current_curfew().await?;
    Ok(Json(ApiResponse::ok(curfew)))
}

/// POST /api/admin/curfew
pub async fn set_curfew(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CurfewRequest>,
) -> Result<Json<ApiResponse<Curfew>>, ApiError> {
    let curfew = state.attendance_service.set_curfew(&auth, &req.time).await?;
    Ok(Json(ApiResponse::ok(curfew)))
}
