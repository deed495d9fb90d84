//! Test helpers for pipeline unit tests
//!
//! In-memory storage with fault injection plus image fixtures.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use picstore_core::{BlobMetadata, ImageFormat};
use picstore_storage::{BlobStream, Storage, StorageBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Mock storage implementation that stores blobs in memory
#[derive(Default)]
pub struct MockStorage {
    files: Mutex<HashMap<String, (BlobMetadata, Vec<u8>)>>,
    fail_upload_suffix: Mutex<Option<String>>,
    stall_upload_suffix: Mutex<Option<String>>,
    fail_deletes: AtomicBool,
    fail_downloads: AtomicBool,
    calls: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload whose key ends with `suffix` fail.
    pub fn fail_uploads_ending_with(&self, suffix: &str) {
        *self.fail_upload_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    /// Make every `upload` whose key ends with `suffix` hang forever.
    pub fn stall_uploads_ending_with(&self, suffix: &str) {
        *self.stall_upload_suffix.lock().unwrap() = Some(suffix.to_string());
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    /// Number of storage operations performed so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_file(&self, key: &str, content_type: &str, data: Vec<u8>) {
        let meta = BlobMetadata::new(content_type, data.len() as u64);
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (meta, data));
    }

    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).map(|(_, d)| d.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn store(&self, key: &str, content_type: &str, data: Vec<u8>) -> StorageResult<BlobMetadata> {
        let failing = self.fail_upload_suffix.lock().unwrap().clone();
        if failing.is_some_and(|suffix| key.ends_with(&suffix)) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", key)));
        }
        let meta = BlobMetadata::new(content_type, data.len() as u64);
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (meta.clone(), data));
        Ok(meta)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        key: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<BlobMetadata> {
        self.record_call();
        let stall = self
            .stall_upload_suffix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| key.ends_with(suffix));
        if stall {
            std::future::pending::<()>().await;
        }
        self.store(key, content_type, data)
    }

    async fn upload_stream(
        &self,
        key: &str,
        content_type: &str,
        _content_length: Option<u64>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<BlobMetadata> {
        self.record_call();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        self.store(key, content_type, data)
    }

    async fn download_stream(&self, key: &str) -> StorageResult<(BlobMetadata, BlobStream)> {
        self.record_call();
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed("injected failure".to_string()));
        }
        let (meta, data) = self
            .files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        let body: BlobStream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));
        Ok((meta, body))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record_call();
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(format!("injected failure for {}", key)));
        }
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Encode a solid-colour image of the given size.
pub fn encode_solid(width: u32, height: u32, rgb: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb(rgb),
    ));
    crate::image::encode(&img, format).unwrap()
}
