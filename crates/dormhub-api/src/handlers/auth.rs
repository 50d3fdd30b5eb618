//! Sign-in, sign-out and self-service profile handlers shared by the
//! three role groups.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use dormhub_entity::account::{Role, Staff};
use dormhub_service::LoginResult;
use dormhub_service::account::AccountView;
use dormhub_service::account::profile::UpdateProfileRequest;

use crate::dto::request::{AvailabilityRequest, ChangePasswordRequest, LoginRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

type LoginResponse = (CookieJar, Json<ApiResponse<LoginResult>>);

async fn login(
    state: &AppState,
    role: Role,
    jar: CookieJar,
    req: LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let result = state
        .auth_service
        .login(role, &req.email, &req.password)
        .await?;

    let cookie = Cookie::build((
        state.config.auth.cookie_name.clone(),
        result.token.token.clone(),
    ))
    .http_only(true)
    .same_site(SameSite::Lax)
    .secure(state.config.auth.cookie_secure)
    .path("/");

    Ok((jar.add(cookie), Json(ApiResponse::ok(result))))
}

/// POST /api/students/login
pub async fn student_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<LoginResponse, ApiError> {
    login(&state, Role::Student, jar, req).await
}

/// POST /api/staff/login
pub async fn staff_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<LoginResponse, ApiError> {
    login(&state, Role::Staff, jar, req).await
}

/// POST /api/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<LoginResponse, ApiError> {
    login(&state, Role::Admin, jar, req).await
}

/// POST /api/{group}/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    tracing::info!(user_id = %auth.user_id, role = %auth.role, "Logged out");
    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), "")).path("/");
    (
        jar.remove(cookie),
        Json(ApiResponse::ok(MessageResponse::new("Logged out successfully"))),
    )
}

/// GET /api/{group}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let profile = state.profile_service.get_profile(&auth).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/{group}/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountView>>, ApiError> {
    let profile = state.profile_service.update_profile(&auth, req).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PUT /api/{group}/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .profile_service
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password changed successfully",
    ))))
}

/// PUT /api/staff/availability
pub async fn set_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<ApiResponse<Staff>>, ApiError> {
    let staff = state.profile_service.set_availability(&auth, req.status).await?;
    Ok(Json(ApiResponse::ok(staff)))
}
