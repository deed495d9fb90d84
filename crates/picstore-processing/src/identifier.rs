//! Asset identifier generation

use picstore_core::{AppError, AssetId};
use rand::rngs::OsRng;
use rand::TryRngCore;

/// Source of fresh asset identifiers.
pub trait IdentifierSource: Send + Sync {
    fn new_identifier(&self) -> Result<AssetId, AppError>;
}

/// UUID v4 identifiers drawn from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifiers;

impl IdentifierSource for RandomIdentifiers {
    fn new_identifier(&self) -> Result<AssetId, AppError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "OS entropy source unavailable");
            AppError::Internal("failed to create uuid".to_string())
        })?;

        let uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Ok(AssetId::from_uuid(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_identifiers_are_v4_and_unique() {
        let source = RandomIdentifiers;
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let id = source.new_identifier().unwrap();
            assert_eq!(id.as_uuid().get_version_num(), 4);
            assert!(seen.insert(id));
        }
    }
}
