//! Admin dashboard.

use axum::Json;
use axum::extract::State;

use dormhub_service::analytics::Dashboard;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/admin/analytics
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.analytics_service.dashboard().await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}
