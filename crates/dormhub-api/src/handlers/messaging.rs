//! Direct messaging between students and admins.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use dormhub_entity::messaging::Message;
use dormhub_service::messaging::{ConversationSummary, SendMessageRequest};

use crate::dto::response::{ApiResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/{students|admin}/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ConversationSummary>>>, ApiError> {
    let conversations = state.messaging_service.list_conversations(&auth).await?;
    Ok(Json(ApiResponse::ok(conversations)))
}

/// POST /api/{students|admin}/conversations
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    let message = state.messaging_service.send_message(&auth, req).await?;
    Ok(Json(ApiResponse::ok(message)))
}

/// GET /api/{students|admin}/conversations/{id}/messages
///
/// Marks the caller's incoming messages in the conversation read.
pub async fn fetch_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state
        .messaging_service
        .fetch_messages(&auth, conversation_id)
        .await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// GET /api/{students|admin}/conversations/unread-count
pub async fn unread_messages(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.messaging_service.unread_count(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
