//! Disciplinary record handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use dormhub_entity::offense::Offense;
use dormhub_service::offense::OffenseRequest;

use crate::dto::request::OffenseQuery;
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/{students|admin}/offenses
///
/// Students always get their own record; the filter only applies to admins.
pub async fn list_offenses(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<OffenseQuery>,
) -> Result<Json<ApiResponse<Vec<Offense>>>, ApiError> {
    let offenses = state
        .offense_service
        .list(&auth, query.student_id)
        .await?;
    Ok(Json(ApiResponse::ok(offenses)))
}

/// POST /api/admin/offenses
pub async fn record_offense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<OffenseRequest>,
) -> Result<Json<ApiResponse<Offense>>, ApiError> {
    let offense = state.offense_service.record(&auth, req).await?;
    Ok(Json(ApiResponse::ok(offense)))
}

/// DELETE /api/admin/offenses/{id}
pub async fn delete_offense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.offense_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Offense deleted"))))
}
