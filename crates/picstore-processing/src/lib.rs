//! Picstore Processing Library
//!
//! Content sniffing, thumbnail rendering and the upload and retrieval
//! pipelines that sit between the HTTP layer and the blob store.

pub mod identifier;
pub mod image;
pub mod retrieval;
pub mod sniff;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use identifier::{IdentifierSource, RandomIdentifiers};
pub use retrieval::{RetrievalPipeline, RetrievedBlob};
pub use sniff::{classify, detect_content_type};
pub use upload::{UploadOutcome, UploadPipeline, UploadRequest};
