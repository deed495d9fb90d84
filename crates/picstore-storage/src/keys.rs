//! Shared key generation for storage backends.
//!
//! Key format: `photos/{uuid}.{variant suffix}`.

use picstore_core::{AssetId, Variant};

const KEY_PREFIX: &str = "photos";

/// Generate the storage key for one variant of an asset.
///
/// Exactly one key exists per `(id, variant)` pair, so lookups never need to
/// list or guess. All backends must use this format.
pub fn blob_key(id: AssetId, variant: Variant) -> String {
    format!("{}/{}.{}", KEY_PREFIX, id, variant.suffix())
}
