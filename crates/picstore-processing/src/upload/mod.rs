//! Upload pipeline: sniff → identify → store original → thumbnail → store.

mod pipeline;
mod rollback;
mod types;

pub use pipeline::UploadPipeline;
pub use types::{UploadOutcome, UploadRequest};
