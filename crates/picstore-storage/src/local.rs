use crate::traits::{BlobStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use picstore_core::BlobMetadata;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Local filesystem storage implementation
///
/// Each blob is a plain file at `{base_path}/{key}`. Its content type is kept
/// in a JSON sidecar next to it (`{key}.meta`). Writes go to a uniquely named
/// temporary file and are renamed into place, so a key is either absent or
/// complete.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for blob storage (e.g., "/var/lib/picstore/images")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Only plain relative components are allowed, so the resulting path can
    /// never escape the base storage directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(relative))
    }

    fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        Self::with_suffix(path, ".meta")
    }

    fn temp_path(path: &Path) -> PathBuf {
        Self::with_suffix(path, &format!(".{}.tmp", Uuid::new_v4().simple()))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Stream `reader` into a temporary file next to `path`, then publish the
    /// sidecar and the data file with renames.
    async fn write_blob(
        &self,
        path: &Path,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<BlobMetadata> {
        self.ensure_parent_dir(path).await?;

        let data_tmp = Self::temp_path(path);
        let result = self
            .write_blob_inner(path, &data_tmp, content_type, reader)
            .await;

        if result.is_err() {
            let _ = fs::remove_file(&data_tmp).await;
        }
        result
    }

    async fn write_blob_inner(
        &self,
        path: &Path,
        data_tmp: &Path,
        content_type: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<BlobMetadata> {
        let mut file = fs::File::create(data_tmp).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                data_tmp.display(),
                e
            ))
        })?;

        let bytes_copied = tokio::io::copy(reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                data_tmp.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                data_tmp.display(),
                e
            ))
        })?;
        drop(file);

        let metadata = BlobMetadata::new(content_type, bytes_copied);
        self.write_sidecar(path, &metadata).await?;

        fs::rename(data_tmp, path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to move {} into place: {}",
                path.display(),
                e
            ))
        })?;

        Ok(metadata)
    }

    async fn write_sidecar(&self, path: &Path, metadata: &BlobMetadata) -> StorageResult<()> {
        let sidecar = Self::sidecar_path(path);
        let sidecar_tmp = Self::temp_path(&sidecar);
        let encoded = serde_json::to_vec(metadata)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode metadata: {}", e)))?;

        let result = async {
            let mut file = fs::File::create(&sidecar_tmp).await?;
            file.write_all(&encoded).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&sidecar_tmp, &sidecar).await
        }
        .await;

        result.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write metadata {}: {}",
                sidecar.display(),
                e
            ))
        })
    }

    /// Content type recorded at upload time, or a generic binary type when the
    /// sidecar is missing or unreadable.
    async fn read_content_type(&self, path: &Path) -> String {
        let sidecar = Self::sidecar_path(path);
        match fs::read(&sidecar).await {
            Ok(raw) => match serde_json::from_slice::<BlobMetadata>(&raw) {
                Ok(meta) => meta.content_type,
                Err(e) => {
                    tracing::warn!(
                        path = %sidecar.display(),
                        error = %e,
                        "Ignoring unreadable metadata sidecar"
                    );
                    FALLBACK_CONTENT_TYPE.to_string()
                }
            },
            Err(_) => FALLBACK_CONTENT_TYPE.to_string(),
        }
    }

    async fn remove_if_present(path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<BlobMetadata> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let metadata = self
            .write_blob(&path, content_type, &mut data.as_slice())
            .await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = metadata.content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(metadata)
    }

    async fn upload_stream(
        &self,
        key: &str,
        content_type: &str,
        _content_length: Option<u64>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<BlobMetadata> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let metadata = self.write_blob(&path, content_type, reader).await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = metadata.content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(metadata)
    }

    async fn download_stream(&self, key: &str) -> StorageResult<(BlobMetadata, BlobStream)> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to open file {}: {}",
                path.display(),
                e
            )),
        })?;

        let content_length = file
            .metadata()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .len();
        let content_type = self.read_content_type(&path).await;

        let reader = tokio_util::io::ReaderStream::new(file);

        let key = key.to_string();
        let path_display = path.display().to_string();
        let stream = reader.map(move |result| {
            result.map_err(|e| {
                tracing::error!(
                    path = %path_display,
                    key = %key,
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage stream download error"
                );
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok((
            BlobMetadata::new(content_type, content_length),
            Box::pin(stream),
        ))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let removed = Self::remove_if_present(&path).await?;
        Self::remove_if_present(&Self::sidecar_path(&path)).await?;

        if removed {
            tracing::info!(
                path = %path.display(),
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Local storage delete successful"
            );
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn read_all(storage: &LocalStorage, key: &str) -> StorageResult<Vec<u8>> {
        let (_, mut stream) = storage.download_stream(key).await?;
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = b"\x89PNG fake".to_vec();
        let meta = storage
            .upload("photos/a.origin", "image/png", data.clone())
            .await
            .unwrap();

        assert_eq!(meta, BlobMetadata::new("image/png", data.len() as u64));

        let downloaded = read_all(&storage, "photos/a.origin").await.unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download_stream("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.upload("/etc/passwd", "text/plain", b"x".to_vec()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.delete("photos/nonexistent.origin").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_delete_removes_sidecar() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload("photos/b.origin", "image/gif", b"GIF89a".to_vec())
            .await
            .unwrap();
        assert!(dir.path().join("photos/b.origin").exists());

        storage.delete("photos/b.origin").await.unwrap();

        assert!(!dir.path().join("photos/b.origin").exists());
        assert!(!dir.path().join("photos/b.origin.meta").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.download_stream("photos/missing.origin").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_local_storage_stream_roundtrip_keeps_metadata() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = vec![7u8; 200_000];
        let mut cursor = std::io::Cursor::new(data.clone());

        let meta = storage
            .upload_stream(
                "photos/c.300x300",
                "image/jpeg",
                Some(data.len() as u64),
                &mut cursor,
            )
            .await
            .unwrap();
        assert_eq!(meta.content_length, data.len() as u64);

        let (meta, mut stream) = storage.download_stream("photos/c.300x300").await.unwrap();
        assert_eq!(meta.content_type, "image/jpeg");
        assert_eq!(meta.content_length, data.len() as u64);

        let mut downloaded = Vec::new();
        while let Some(chunk_result) = stream.next().await {
            downloaded.extend_from_slice(&chunk_result.unwrap());
        }
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload("photos/d.origin", "image/png", b"first".to_vec())
            .await
            .unwrap();
        storage
            .upload("photos/d.origin", "image/png", b"second".to_vec())
            .await
            .unwrap();

        assert_eq!(
            read_all(&storage, "photos/d.origin").await.unwrap(),
            b"second".to_vec()
        );

        let mut names: Vec<String> = std::fs::read_dir(dir.path().join("photos"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["d.origin", "d.origin.meta"]);
    }

    #[tokio::test]
    async fn test_missing_sidecar_falls_back_to_octet_stream() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        std::fs::create_dir_all(dir.path().join("photos")).unwrap();
        std::fs::write(dir.path().join("photos/e.origin"), b"raw").unwrap();

        let (meta, _) = storage.download_stream("photos/e.origin").await.unwrap();
        assert_eq!(meta.content_type, FALLBACK_CONTENT_TYPE);
        assert_eq!(meta.content_length, 3);
    }
}
