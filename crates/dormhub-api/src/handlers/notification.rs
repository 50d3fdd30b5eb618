//! Notification handlers, mounted under every role group.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Serialize;
use uuid::Uuid;

use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::notification::Notification;

use crate::dto::request::NotificationQuery;
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// Rows touched by a bulk action.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    /// Affected notifications.
    pub affected: u64,
}

/// GET /api/{group}/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NotificationQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Notification>>>, ApiError> {
    let notifications = state
        .notification_service
        .list(&auth, query.unread_only, params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

/// GET /api/{group}/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.notification_service.unread_count(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/{group}/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.notification_service.mark_read(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Marked as read"))))
}

/// PUT /api/{group}/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<BulkResult>>, ApiError> {
    let affected = state.notification_service.mark_all_read(&auth).await?;
    Ok(Json(ApiResponse::ok(BulkResult { affected })))
}

/// DELETE /api/{group}/notifications/{id}
///
/// A broadcast is only removed from the caller's inbox.
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.notification_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Notification deleted",
    ))))
}

/// DELETE /api/{group}/notifications
pub async fn delete_all(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<BulkResult>>, ApiError> {
    let affected = state.notification_service.delete_all(&auth).await?;
    Ok(Json(ApiResponse::ok(BulkResult { affected })))
}
