//! Error types module
//!
//! Every failure in the upload and retrieval pipelines is an [`AppError`]. The
//! variants are the error classes a caller can observe; the payload is a flat,
//! human-readable message built up by wrapping each cause with the operation
//! that failed (`"detecting file type failed: text/plain; charset=utf-8 is not allowed"`).

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected content
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "BAD_TYPE")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Malformed client input: bad multipart body, unknown `format` value.
    #[error("{0}")]
    BadRequest(String),

    /// Content failed image-type sniffing or codec dispatch.
    #[error("{0}")]
    BadType(String),

    /// Unknown identifier or variant.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// I/O, entropy, decode or storage backend failure.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Prefix the message with the operation that failed, keeping the error class.
    pub fn context(self, operation: impl AsRef<str>) -> Self {
        let op = operation.as_ref();
        self.map_message(|msg| format!("{}: {}", op, msg))
    }

    /// Rewrite the message, keeping the error class.
    pub fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            AppError::BadRequest(msg) => AppError::BadRequest(f(msg)),
            AppError::BadType(msg) => AppError::BadType(f(msg)),
            AppError::NotFound(msg) => AppError::NotFound(f(msg)),
            AppError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(f(msg)),
            AppError::Internal(msg) => AppError::Internal(f(msg)),
        }
    }

    /// Get the error type name for logging
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::BadType(_) => "BadType",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::BadType(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

/// Attach the failing operation to an `AppError` result.
pub trait ErrorContext<T> {
    fn context(self, operation: &str) -> Result<T, AppError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, operation: &str) -> Result<T, AppError> {
        self.map_err(|e| Into::<AppError>::into(e).context(operation))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::BadRequest(_) => (400, "BAD_REQUEST", false, LogLevel::Debug),
        AppError::BadType(_) => (406, "BAD_TYPE", false, LogLevel::Warn),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.message().to_string(),
        }
    }
}
