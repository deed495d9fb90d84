//! Retrieval of stored variants by identifier.

use picstore_core::{AppError, AssetId, BlobMetadata, Variant};
use picstore_storage::{blob_key, BlobStream, Storage, StorageError};
use std::fmt;
use std::sync::Arc;

/// An open stored variant, ready to be streamed to the client.
pub struct RetrievedBlob {
    pub asset_id: AssetId,
    pub variant: Variant,
    pub metadata: BlobMetadata,
    pub body: BlobStream,
}

impl fmt::Debug for RetrievedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrievedBlob")
            .field("asset_id", &self.asset_id)
            .field("variant", &self.variant)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

pub struct RetrievalPipeline {
    storage: Arc<dyn Storage>,
}

impl RetrievalPipeline {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Resolve a raw identifier and optional `format` value to a stored blob.
    ///
    /// The format is validated first, so a bad format never reaches storage.
    /// Malformed and unknown identifiers both yield `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn retrieve(
        &self,
        identifier: &str,
        format: Option<&str>,
    ) -> Result<RetrievedBlob, AppError> {
        let variant = Variant::from_query(format)?;
        let asset_id: AssetId = identifier.parse()?;
        self.retrieve_variant(asset_id, variant).await
    }

    /// Open the single blob stored for `(asset_id, variant)`.
    pub async fn retrieve_variant(
        &self,
        asset_id: AssetId,
        variant: Variant,
    ) -> Result<RetrievedBlob, AppError> {
        let key = blob_key(asset_id, variant);

        let (metadata, body) = self
            .storage
            .download_stream(&key)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => AppError::NotFound("photo not found".to_string()),
                other => AppError::from(other).context("failed to open photo"),
            })?;

        tracing::debug!(
            key = %key,
            content_type = %metadata.content_type,
            size_bytes = metadata.content_length,
            "Opened stored variant"
        );

        Ok(RetrievedBlob {
            asset_id,
            variant,
            metadata,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockStorage;

    #[tokio::test]
    async fn test_unknown_identifier_is_not_found() {
        let storage = Arc::new(MockStorage::new());
        let retrieval = RetrievalPipeline::new(storage);

        let err = retrieval
            .retrieve("67e55044-10b1-426f-9247-bb680e5fe0c8", None)
            .await
            .unwrap_err();

        assert_eq!(err, AppError::NotFound("photo not found".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_not_found() {
        let storage = Arc::new(MockStorage::new());
        let retrieval = RetrievalPipeline::new(storage.clone());

        let err = retrieval.retrieve("not-a-uuid", None).await.unwrap_err();

        assert_eq!(err, AppError::NotFound("bad uuid".to_string()));
        assert_eq!(storage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_format_never_touches_storage() {
        let storage = Arc::new(MockStorage::new());
        let retrieval = RetrievalPipeline::new(storage.clone());

        let err = retrieval
            .retrieve("67e55044-10b1-426f-9247-bb680e5fe0c8", Some("640x480"))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::BadRequest("bad format 640x480".to_string()));
        assert_eq!(storage.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_format_selects_original() {
        let storage = Arc::new(MockStorage::new());
        let id: AssetId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        storage.set_file(&blob_key(id, Variant::Original), "image/gif", b"GIF89a".to_vec());

        let retrieval = RetrievalPipeline::new(storage);
        let blob = retrieval.retrieve(&id.to_string(), Some("")).await.unwrap();

        assert_eq!(blob.variant, Variant::Original);
        assert_eq!(blob.metadata, BlobMetadata::new("image/gif", 6));
    }

    #[tokio::test]
    async fn test_backend_failure_is_internal() {
        let storage = Arc::new(MockStorage::new());
        storage.fail_downloads();
        let retrieval = RetrievalPipeline::new(storage);

        let err = retrieval
            .retrieve("67e55044-10b1-426f-9247-bb680e5fe0c8", Some("300x300"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.message().starts_with("failed to open photo: "));
    }
}
