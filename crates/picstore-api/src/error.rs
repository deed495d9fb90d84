//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that
//! converts into [`AppError`] renders as a `{"message": ...}` body with the
//! status from [`ErrorMetadata::http_status_code`].

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::QueryRejection,
    extract::{FromRequest, FromRequestParts, Multipart, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use picstore_core::{AppError, ErrorMetadata, LogLevel};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

static HIDE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Replace internal error details with a generic message in responses.
///
/// Set once during setup from the configured environment.
pub fn hide_internal_details(hide: bool) {
    HIDE_INTERNAL_DETAILS.store(hide, Ordering::Relaxed);
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of what failed
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from picstore-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<MultipartRejection> for HttpAppError {
    fn from(rejection: MultipartRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "invalid multipart body: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::BadRequest(format!(
            "invalid query string: {}",
            rejection.body_text()
        )))
    }
}

/// True if a body length limit anywhere below `err` cut the stream short.
fn hit_body_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Body-limit violations surface while reading fields; keep them as 413.
impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE || hit_body_limit(&err) {
            HttpAppError(AppError::PayloadTooLarge(
                "request body exceeds the upload limit".to_string(),
            ))
        } else {
            HttpAppError(AppError::BadRequest(format!(
                "malformed multipart body: {}",
                err.body_text()
            )))
        }
    }
}

/// Multipart extractor that answers with our ErrorResponse format (400 + JSON)
/// when the request is not `multipart/form-data`.
pub struct PhotoMultipart(pub Multipart);

impl<S> FromRequest<S> for PhotoMultipart
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(PhotoMultipart(multipart))
    }
}

/// Query string extractor that answers with our ErrorResponse format (400 + JSON)
/// when the parameters do not deserialize.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedQuery(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(
                error = %error,
                error_type = error_type,
                code = code,
                "Error occurred"
            );
        }
        LogLevel::Warn => {
            tracing::warn!(
                error = %error,
                error_type = error_type,
                code = code,
                "Error occurred"
            );
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                code = code,
                "Error occurred"
            );
        }
    }
}

fn response_message(error: &AppError) -> String {
    if error.is_sensitive() && HIDE_INTERNAL_DETAILS.load(Ordering::Relaxed) {
        error.client_message()
    } else {
        error.message().to_string()
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        log_error(error);

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(ErrorResponse::new(response_message(error)))).into_response()
    }
}
