//! Image processing module
//!
//! This module provides the thumbnail path of the upload pipeline:
//! - Per-format decode and encode (codec)
//! - Exact-size bicubic resizing (resize)

pub mod codec;
pub mod resize;

pub use codec::{decode, encode};
pub use resize::resize_exact;

use picstore_core::{AppError, ImageFormat};

/// Decode `data`, stretch it to `width × height` and re-encode it in the same format.
///
/// CPU-bound; callers on the async runtime should run it via `spawn_blocking`.
pub fn render_thumbnail(
    data: &[u8],
    format: ImageFormat,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, AppError> {
    let img = decode(data, format)?;
    let resized = resize_exact(&img, width, height);
    encode(&resized, format)
}
