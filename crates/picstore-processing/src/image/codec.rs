//! Per-format decoding and encoding
//!
//! Each accepted [`ImageFormat`] has exactly one decoder and one encoder,
//! selected by an exhaustive match.

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Frame};
use picstore_core::{AppError, ImageFormat};

/// JPEG output quality
pub const JPEG_QUALITY: u8 = 75;

/// GIF palette quantization speed (1 = best, 30 = fastest)
const GIF_SPEED: i32 = 10;

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

/// Decode `data` as `format`. Animated GIFs yield their first frame.
pub fn decode(data: &[u8], format: ImageFormat) -> Result<DynamicImage, AppError> {
    image::load_from_memory_with_format(data, codec_format(format)).map_err(|e| {
        tracing::debug!(error = %e, format = %format, "Decode failed");
        AppError::Internal("can't decode origin".to_string())
    })
}

/// Encode `img` as `format`.
///
/// JPEG output drops alpha. GIF output is a single frame.
pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();

    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)),
        ImageFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buffer)),
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_SPEED);
            encoder.encode_frame(Frame::new(img.to_rgba8()))
        }
    };

    result.map_err(|e| {
        tracing::debug!(error = %e, format = %format, "Encode failed");
        AppError::Internal("failed to resize".to_string())
    })?;

    Ok(buffer)
}
