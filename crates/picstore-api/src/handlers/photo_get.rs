use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use futures::StreamExt;
use picstore_core::AppError;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhotoQuery {
    /// `origin` (default) or `300x300`
    pub format: Option<String>,
}

#[utoipa::path(
    get,
    path = "/photos/{photo_uuid}",
    tag = "photos",
    params(
        ("photo_uuid" = String, Path, description = "Identifier returned by the upload"),
        PhotoQuery
    ),
    responses(
        (status = 200, description = "Stored image bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Unknown or repeated format", body = ErrorResponse),
        (status = 404, description = "Photo not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_photo"))]
pub async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(photo_uuid): Path<String>,
    ValidatedQuery(query): ValidatedQuery<PhotoQuery>,
) -> Result<Response, HttpAppError> {
    let blob = state
        .retrieval
        .retrieve(&photo_uuid, query.format.as_deref())
        .await?;

    let body_stream = blob.body.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, blob.metadata.content_type.as_str())
        .header(header::CONTENT_LENGTH, blob.metadata.content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", blob.asset_id),
        )
        .body(Body::from_stream(body_stream))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
