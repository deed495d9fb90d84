//! HTTP-level constants

/// Path of the served OpenAPI document
pub const OPENAPI_PATH: &str = "/api/openapi.json";

/// Headroom on top of the upload limit for multipart boundaries and part headers
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;
