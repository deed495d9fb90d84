//! Application state

use picstore_core::Config;
use picstore_processing::{RetrievalPipeline, UploadPipeline};
use picstore_storage::Storage;
use std::sync::Arc;

/// Shared state handed to every handler.
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub uploads: UploadPipeline,
    pub retrieval: RetrievalPipeline,
}

impl AppState {
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Self {
        let uploads = UploadPipeline::new(storage.clone(), config.max_upload_size_bytes);
        let retrieval = RetrievalPipeline::new(storage.clone());
        Self {
            storage,
            uploads,
            retrieval,
        }
    }
}
