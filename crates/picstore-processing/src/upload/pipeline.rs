//! The canonical upload flow.
//!
//! Each step gates the next. Nothing is written until the content has been
//! sniffed and an identifier obtained. Once the original is stored, a
//! [`RollbackGuard`] owns every written key until all derived variants are
//! stored as well, so a failed upload never leaves a retrievable original.

use bytes::Bytes;
use picstore_core::{AppError, AssetId, BlobMetadata, ErrorContext, ImageFormat, Variant};
use picstore_storage::{blob_key, Storage};
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

use super::rollback::RollbackGuard;
use super::types::{UploadOutcome, UploadRequest};
use crate::identifier::{IdentifierSource, RandomIdentifiers};
use crate::image::render_thumbnail;
use crate::sniff;

pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    identifiers: Arc<dyn IdentifierSource>,
    max_upload_size: u64,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn Storage>, max_upload_size: u64) -> Self {
        Self {
            storage,
            identifiers: Arc::new(RandomIdentifiers),
            max_upload_size,
        }
    }

    pub fn with_identifier_source(mut self, identifiers: Arc<dyn IdentifierSource>) -> Self {
        self.identifiers = identifiers;
        self
    }

    /// Store an upload and its thumbnail, returning the new identifier only
    /// once both are durably written.
    #[tracing::instrument(skip(self, request), fields(declared_size = ?request.declared_size))]
    pub async fn upload<R>(&self, request: UploadRequest<R>) -> Result<UploadOutcome, AppError>
    where
        R: AsyncRead + AsyncSeek + Send + Unpin,
    {
        let start = std::time::Instant::now();
        let UploadRequest {
            mut reader,
            declared_size,
            buffered,
        } = request;

        if let Some(size) = declared_size {
            self.check_size(size)?;
        }

        let format = sniff::classify(&mut reader)
            .await
            .context("detecting file type failed")?;

        let asset_id = self.identifiers.new_identifier()?;

        let original_key = blob_key(asset_id, Variant::Original);
        let original = {
            let mut limited = (&mut reader).take(self.max_upload_size + 1);
            self.storage
                .upload_stream(
                    &original_key,
                    format.content_type(),
                    declared_size,
                    &mut limited,
                )
                .await
                .context("failed to copy original")?
        };

        let mut guard = RollbackGuard::new(self.storage.clone());
        guard.register(original_key);

        // Undeclared sizes are only known once the original is written.
        let derived = match self.check_size(original.content_length) {
            Ok(()) => self
                .store_derived(&mut reader, buffered, asset_id, format, &original, &mut guard)
                .await
                .map_err(|e| e.context("resizing failed")),
            Err(e) => Err(e),
        };

        let thumbnail = match derived {
            Ok(thumbnail) => {
                guard.disarm();
                thumbnail
            }
            Err(e) => return Err(guard.rollback(e).await),
        };

        tracing::info!(
            asset_id = %asset_id,
            format = %format,
            original_bytes = original.content_length,
            thumbnail_bytes = thumbnail.content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload stored"
        );

        Ok(UploadOutcome {
            asset_id,
            format,
            original,
            thumbnail,
        })
    }

    fn check_size(&self, size: u64) -> Result<(), AppError> {
        if size > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "upload of {} bytes exceeds the {} byte limit",
                size, self.max_upload_size
            )));
        }
        Ok(())
    }

    /// Render and store every sized variant, registering each key with the
    /// guard before its write.
    async fn store_derived<R>(
        &self,
        reader: &mut R,
        buffered: Option<Bytes>,
        asset_id: AssetId,
        format: ImageFormat,
        original: &BlobMetadata,
        guard: &mut RollbackGuard,
    ) -> Result<BlobMetadata, AppError>
    where
        R: AsyncRead + AsyncSeek + Send + Unpin,
    {
        let data = match buffered {
            Some(data) => data,
            None => read_back(reader, original, self.max_upload_size).await?,
        };

        let mut thumbnail = None;
        for variant in Variant::ALL {
            let Some((width, height)) = variant.dimensions() else {
                continue;
            };

            let source = data.clone();
            let bytes = tokio::task::spawn_blocking(move || {
                render_thumbnail(&source, format, width, height)
            })
            .await
            .map_err(|e| AppError::Internal(format!("thumbnail task failed: {}", e)))??;

            let key = blob_key(asset_id, variant);
            guard.register(key.clone());
            let stored = self
                .storage
                .upload(&key, format.content_type(), bytes)
                .await
                .context("failed to store thumbnail")?;

            if variant == Variant::Thumbnail {
                thumbnail = Some(stored);
            }
        }

        thumbnail.ok_or_else(|| AppError::Internal("no thumbnail variant configured".to_string()))
    }
}

/// Rewind and read the whole upload again for decoding.
async fn read_back<R>(
    reader: &mut R,
    original: &BlobMetadata,
    max_upload_size: u64,
) -> Result<Bytes, AppError>
where
    R: AsyncRead + AsyncSeek + Send + Unpin,
{
    reader
        .seek(SeekFrom::Start(0))
        .await
        .map_err(|e| AppError::Internal(format!("failed to seek: {}", e)))?;

    let mut data = Vec::with_capacity(original.content_length as usize);
    reader
        .take(max_upload_size + 1)
        .read_to_end(&mut data)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read origin: {}", e)))?;
    Ok(Bytes::from(data))
}
