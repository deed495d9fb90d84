//! Picstore Storage Library
//!
//! This crate provides the blob store abstraction and its implementations.
//! It includes the Storage trait and implementations for S3 and local filesystem.
//!
//! # Storage key format
//!
//! Every stored variant lives under a single flat key derived from the asset
//! identifier and the variant suffix:
//!
//! - **Original**: `photos/{uuid}.origin`
//! - **Thumbnail**: `photos/{uuid}.300x300`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::blob_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use picstore_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStream, Storage, StorageError, StorageResult};
