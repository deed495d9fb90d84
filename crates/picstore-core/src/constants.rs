/// Edge length of the square thumbnail derived from every upload.
pub const THUMBNAIL_SIZE: u32 = 300;

/// Number of leading bytes inspected when sniffing content type.
pub const SNIFF_LEN: usize = 512;

/// Multipart form field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "photo";

/// Default maximum accepted upload, in megabytes.
pub const MAX_UPLOAD_SIZE_MB: u64 = 32;

/// Region used for the object store when none is configured.
pub const DEFAULT_S3_REGION: &str = "eu-central-1";

pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "images";
