//! Role gates for the per-role route groups.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use dormhub_core::AppError;
use dormhub_entity::account::Role;

use crate::error::ApiError;
use crate::extractors::auth::{authenticate, resolve_token};
use crate::state::AppState;

/// Reject the request unless it carries a valid token for `role`.
///
/// Missing or invalid tokens yield 401, a valid token for another role
/// yields 403. On success the decoded context is stored in the request
/// extensions for the `AuthUser` extractor.
async fn gate(state: &AppState, role: Role, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = resolve_token(request.headers(), request.uri(), &state.config.auth.cookie_name);
    let ctx = authenticate(&state.jwt_decoder, token)?;

    if ctx.role != role {
        tracing::debug!(user_id = %ctx.user_id, role = %ctx.role, required = %role, "Role gate refused");
        return Err(AppError::authorization(format!("This area is restricted to the {role} role")).into());
    }

    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Gate for `/api/students`.
pub async fn require_student(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, Role::Student, request, next).await
}

/// Gate for `/api/staff`.
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, Role::Staff, request, next).await
}

/// Gate for `/api/admin`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    gate(&state, Role::Admin, request, next).await
}
