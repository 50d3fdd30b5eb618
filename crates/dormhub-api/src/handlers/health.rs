//! Health check handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::dto::response::{ApiResponse, HealthResponse, ReadinessResponse};
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        realtime: state.registry.stats(),
    }))
}

/// GET /health/ready
///
/// 503 until both the database and the upload directory answer.
pub async fn ready(State(state): State<AppState>) -> Response {
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Readiness: database unreachable");
            "unreachable"
        }
    };
    let storage = match state.upload_service.health_check().await {
        Ok(true) => "available",
        Ok(false) => "unavailable",
        Err(e) => {
            tracing::warn!(error = %e, "Readiness: storage check failed");
            "unavailable"
        }
    };

    let ready = database == "connected" && storage == "available";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadinessResponse {
        status: if ready { "ready" } else { "not_ready" },
        database,
        storage,
    };
    (status, Json(ApiResponse { success: ready, data: body })).into_response()
}
