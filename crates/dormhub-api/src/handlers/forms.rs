//! Service request form handlers for all three role groups.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::types::pagination::PageResponse;
use dormhub_entity::form::{Form, FormStatus, NewForm};
use dormhub_storage::UploadCategory;

use crate::dto::request::{
    AssignRequest, CompleteRequest, FormQuery, FormStatusRequest, RescheduleRequest, ReviewDto,
};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams, ValidatedJson};
use crate::handlers::uploads::read_files;
use crate::state::AppState;

/// GET /api/{group}/forms
///
/// Students and staff only see their own forms whatever the filter says.
pub async fn list_forms(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FormQuery>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Form>>>, ApiError> {
    let forms = state
        .form_service
        .list(&auth, query.into(), params.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(forms)))
}

/// GET /api/{group}/forms/{id}
pub async fn get_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state.form_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// POST /api/students/forms
pub async fn submit_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewForm>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state.form_service.submit(&auth, req).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// POST /api/students/forms/{id}/review
pub async fn review_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ReviewDto>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state.form_service.review(&auth, id, req.into()).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// POST /api/students/forms/{id}/reschedule
pub async fn reschedule_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state
        .form_service
        .reschedule(&auth, id, req.preferred_timing)
        .await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// POST /api/students/forms/{id}/attachments
pub async fn add_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    // Fail fast before writing anything for a form the caller cannot touch.
    state.form_service.get(&auth, id).await?;

    let files = read_files(multipart).await?;
    let stored = state
        .upload_service
        .store_all(UploadCategory::Forms, files)
        .await?;
    let paths: Vec<String> = stored.into_iter().map(|f| f.path).collect();

    match state
        .form_service
        .add_attachments(&auth, id, paths.clone())
        .await
    {
        Ok(form) => Ok(Json(ApiResponse::ok(form))),
        Err(e) => {
            for path in &paths {
                state.upload_service.discard(path).await;
            }
            Err(e.into())
        }
    }
}

/// PUT /api/staff/forms/{id}/start
pub async fn start_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state.form_service.start(&auth, id).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// PUT /api/staff/forms/{id}/complete
pub async fn complete_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CompleteRequest>>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let notes = body.and_then(|Json(req)| req.notes);
    let form = state.form_service.complete(&auth, id, notes).await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// PUT /api/admin/forms/{id}/status
///
/// Moving a form to `Assigned` here needs `assigned_staff_id` and goes
/// through the same checks as the assign route.
pub async fn update_form_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<FormStatusRequest>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = if req.status == FormStatus::Assigned {
        let staff_id = req.assigned_staff_id.ok_or_else(|| {
            AppError::validation("assigned_staff_id is required to assign a form")
        })?;
        state.form_service.assign(&auth, id, staff_id, req.notes).await?
    } else {
        state
            .form_service
            .update_status(&auth, id, req.status, req.notes)
            .await?
    };
    Ok(Json(ApiResponse::ok(form)))
}

/// PUT /api/admin/forms/{id}/assign
pub async fn assign_form(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<AssignRequest>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form = state
        .form_service
        .assign(&auth, id, req.staff_id, req.notes)
        .await?;
    Ok(Json(ApiResponse::ok(form)))
}
