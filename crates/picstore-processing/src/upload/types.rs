use bytes::Bytes;
use picstore_core::{AssetId, BlobMetadata, ImageFormat};
use std::io::Cursor;

/// One upload handed to the pipeline.
///
/// The reader must be seekable: sniffing rewinds it to the start, and so does
/// thumbnail generation unless the content is already held in memory.
pub struct UploadRequest<R> {
    pub reader: R,
    /// Size announced by the client, if any. Checked against the upload limit
    /// before anything is read.
    pub declared_size: Option<u64>,
    /// The same content as `reader`, when the caller already buffered it.
    pub(crate) buffered: Option<Bytes>,
}

impl<R> UploadRequest<R> {
    pub fn new(reader: R, declared_size: Option<u64>) -> Self {
        Self {
            reader,
            declared_size,
            buffered: None,
        }
    }
}

impl UploadRequest<Cursor<Bytes>> {
    /// Upload content that is already in memory. The thumbnail is rendered
    /// from the shared buffer instead of a second copy read back from the reader.
    pub fn from_bytes(data: Bytes) -> Self {
        let size = data.len() as u64;
        Self {
            reader: Cursor::new(data.clone()),
            declared_size: Some(size),
            buffered: Some(data),
        }
    }
}

/// Result of a completed upload: both variants are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub asset_id: AssetId,
    pub format: ImageFormat,
    pub original: BlobMetadata,
    pub thumbnail: BlobMetadata,
}
