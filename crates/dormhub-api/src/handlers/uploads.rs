//! Multipart intake helpers and the authenticated download route.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::Response;
use bytes::Bytes;

use dormhub_core::AppError;
use dormhub_core::traits::storage::StoredFile;
use dormhub_storage::UploadCategory;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Upper bound on files in one request.
const MAX_FILES_PER_REQUEST: usize = 10;

/// Read every file part of a multipart body.
pub async fn read_files(
    mut multipart: Multipart,
) -> Result<Vec<(String, Option<String>, Bytes)>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let Some(file_name) = field.file_name().map(String::from) else {
            continue;
        };
        let mime_type = field.content_type().map(String::from);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Read error: {e}")))?;

        files.push((file_name, mime_type, data));
        if files.len() > MAX_FILES_PER_REQUEST {
            return Err(AppError::validation(format!(
                "At most {MAX_FILES_PER_REQUEST} files per request"
            )));
        }
    }

    if files.is_empty() {
        return Err(AppError::validation("No file was uploaded"));
    }
    Ok(files)
}

/// Store the single file of a multipart body.
pub async fn store_single(
    state: &AppState,
    category: UploadCategory,
    multipart: Multipart,
) -> Result<StoredFile, AppError> {
    let mut files = read_files(multipart).await?;
    if files.len() != 1 {
        return Err(AppError::validation("Exactly one file is expected"));
    }
    let (name, mime, data) = files.remove(0);
    state.upload_service.store(category, &name, mime, data).await
}

/// GET /uploads/{category}/{filename}
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((category, file_name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let category: UploadCategory = category.parse()?;
    let download = state.upload_service.open(category, &file_name).await?;
    tracing::debug!(user_id = %auth.user_id, %category, file = %file_name, "Serving upload");

    let response = Response::builder()
        .header(header::CONTENT_TYPE, download.mime_type)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;
    Ok(response)
}
