//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use picstore_core::{AppError, BlobMetadata};
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked blob body as produced by [`Storage::download_stream`].
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("{} not found", key)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// Blobs are addressed by a flat string key (see [`crate::keys`]) and carry
/// their content type and length as metadata. A write either lands completely
/// under its key or not at all; readers never observe a half-written blob.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a fully buffered blob under `key`, replacing any previous value.
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<BlobMetadata>;

    /// Upload a blob from a reader (for large files)
    ///
    /// The reader is consumed until EOF. `content_length` is a hint only; the
    /// returned metadata records the number of bytes actually written.
    async fn upload_stream(
        &self,
        key: &str,
        content_type: &str,
        content_length: Option<u64>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<BlobMetadata>;

    /// Open a blob for streaming, returning its metadata alongside the body.
    ///
    /// Fails with [`StorageError::NotFound`] before any bytes are produced when
    /// the key does not exist.
    async fn download_stream(&self, key: &str) -> StorageResult<(BlobMetadata, BlobStream)>;

    /// Delete a blob. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
