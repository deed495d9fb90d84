//! Domain models for stored photos.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::THUMBNAIL_SIZE;
use crate::error::AppError;

/// Image formats accepted for upload.
///
/// Derived from sniffed content, never stored. Codec dispatch matches on this
/// enum so every format has exactly one decoder and one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Gif];

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Map a sniffed MIME type onto a supported format.
    ///
    /// `image/jpg` is not a registered type but some clients send it.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.content_type())
    }
}

/// Opaque identifier naming one upload's family of stored variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        AssetId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // Canonical lowercase hyphenated form
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for AssetId {
    type Err = AppError;

    /// Only the canonical hyphenated form is accepted so that every identifier
    /// maps to exactly one storage key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::try_parse(s).map_err(|_| AppError::NotFound("bad uuid".to_string()))?;
        let id = AssetId(uuid);
        if id.to_string() != s {
            return Err(AppError::NotFound("bad uuid".to_string()));
        }
        Ok(id)
    }
}

/// One of the two stored representations of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Original,
    Thumbnail,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Original, Variant::Thumbnail];

    /// Suffix used both as the `format` query value and in the storage key.
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Original => "origin",
            Variant::Thumbnail => "300x300",
        }
    }

    /// Target dimensions for derived variants; `None` for the untouched original.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Variant::Original => None,
            Variant::Thumbnail => Some((THUMBNAIL_SIZE, THUMBNAIL_SIZE)),
        }
    }

    /// Parse the optional `format` query value. Absent or empty selects the original.
    pub fn from_query(format: Option<&str>) -> Result<Self, AppError> {
        match format {
            None | Some("") => Ok(Variant::Original),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for Variant {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.suffix() == s)
            .ok_or_else(|| AppError::BadRequest(format!("bad format {}", s)))
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.suffix())
    }
}

/// Content type and length recorded with a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub content_type: String,
    pub content_length: u64,
}

impl BlobMetadata {
    pub fn new(content_type: impl Into<String>, content_length: u64) -> Self {
        Self {
            content_type: content_type.into(),
            content_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_query_defaults_to_original() {
        assert_eq!(Variant::from_query(None).unwrap(), Variant::Original);
        assert_eq!(Variant::from_query(Some("")).unwrap(), Variant::Original);
        assert_eq!(
            Variant::from_query(Some("origin")).unwrap(),
            Variant::Original
        );
        assert_eq!(
            Variant::from_query(Some("300x300")).unwrap(),
            Variant::Thumbnail
        );
    }

    #[test]
    fn test_variant_rejects_unknown_format() {
        let err = Variant::from_query(Some("640x480")).unwrap_err();
        assert_eq!(err, AppError::BadRequest("bad format 640x480".to_string()));
    }

    #[test]
    fn test_asset_id_roundtrips_canonical_form() {
        let uuid = Uuid::new_v4();
        let id = AssetId::from_uuid(uuid);
        let parsed: AssetId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_asset_id_rejects_non_canonical_forms() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let upper = uuid.hyphenated().to_string().to_uppercase();
        let simple = uuid.simple().to_string();

        for candidate in [upper.as_str(), simple.as_str(), "not-a-uuid", "../../etc/passwd"] {
            let err = candidate.parse::<AssetId>().unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{}", candidate);
        }
    }

    #[test]
    fn test_image_format_from_content_type() {
        assert_eq!(
            ImageFormat::from_content_type("image/jpg"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_content_type("image/png"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_content_type("image/webp"), None);
    }
}
