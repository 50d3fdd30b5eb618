//! News board handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use uuid::Uuid;

use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::news::News;
use dormhub_service::news::NewsRequest;
use dormhub_storage::UploadCategory;

use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::handlers::uploads::store_single;
use crate::state::AppState;

/// GET /api/{group}/news
pub async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<News>>>, ApiError> {
    let news = state.news_service.list(params.into_page_request()).await?;
    Ok(Json(ApiResponse::ok(news)))
}

/// GET /api/{group}/news/{id}
pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<News>>, ApiError> {
    let news = state.news_service.get(id).await?;
    Ok(Json(ApiResponse::ok(news)))
}

/// POST /api/admin/news
pub async fn publish_news(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewsRequest>,
) -> Result<Json<ApiResponse<News>>, ApiError> {
    let news = state.news_service.publish(&auth, req).await?;
    Ok(Json(ApiResponse::ok(news)))
}

/// PUT /api/admin/news/{id}
pub async fn update_news(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<NewsRequest>,
) -> Result<Json<ApiResponse<News>>, ApiError> {
    let news = state.news_service.update(&auth, id, req).await?;
    Ok(Json(ApiResponse::ok(news)))
}

/// POST /api/admin/news/{id}/image
pub async fn set_news_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<News>>, ApiError> {
    // Reject unknown posts before the upload hits disk.
    state.news_service.get(id).await?;

    let stored = store_single(&state, UploadCategory::News, multipart).await?;
    match state
        .news_service
        .set_image(&auth, id, stored.path.clone())
        .await
    {
        Ok((news, previous)) => {
            if let Some(old) = previous {
                state.upload_service.discard(&old).await;
            }
            Ok(Json(ApiResponse::ok(news)))
        }
        Err(e) => {
            state.upload_service.discard(&stored.path).await;
            Err(e.into())
        }
    }
}

/// DELETE /api/admin/news/{id}
pub async fn delete_news(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if let Some(image) = state.news_service.delete(&auth, id).await? {
        state.upload_service.discard(&image).await;
    }
    Ok(Json(ApiResponse::ok(MessageResponse::new("News deleted"))))
}
