use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use picstore_core::{constants::UPLOAD_FIELD, AppError};
use picstore_processing::UploadRequest;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError, PhotoMultipart};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Identifier to pass to `GET /photos/{photo_uuid}`
    pub photo_uuid: String,
}

/// Upload photo handler
///
/// Reads the `photo` part of the form, then hands it to the upload pipeline
/// which sniffs the type, stores the original and renders the thumbnail.
///
/// # Errors
/// - `AppError::BadRequest` - Not a multipart body, or no `photo` part
/// - `AppError::BadType` - Content is not JPEG, PNG or GIF
/// - `AppError::PayloadTooLarge` - Upload exceeds the configured limit
/// - `AppError::Internal` - Decode, resize or storage failure
#[utoipa::path(
    post,
    path = "/photos",
    tag = "photos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo stored", body = UploadResponse),
        (status = 400, description = "Malformed form", body = ErrorResponse),
        (status = 406, description = "Unsupported image type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_photo"))]
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    PhotoMultipart(mut multipart): PhotoMultipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let data = read_photo_field(&mut multipart).await?;

    let outcome = state
        .uploads
        .upload(UploadRequest::from_bytes(data))
        .await?;

    tracing::info!(
        photo_uuid = %outcome.asset_id,
        format = %outcome.format,
        size_bytes = outcome.original.content_length,
        "Photo uploaded"
    );

    Ok(Json(UploadResponse {
        photo_uuid: outcome.asset_id.to_string(),
    }))
}

/// Return the first `photo` part; other parts are skipped.
async fn read_photo_field(multipart: &mut Multipart) -> Result<Bytes, HttpAppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        tracing::debug!(
            file_name = ?field.file_name(),
            declared_type = ?field.content_type(),
            "Reading photo field"
        );
        return Ok(field.bytes().await?);
    }

    Err(AppError::BadRequest(format!("missing form field {}", UPLOAD_FIELD)).into())
}
