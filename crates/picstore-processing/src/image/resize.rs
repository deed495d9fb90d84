//! Exact-size resizing

use image::imageops::FilterType;
use image::DynamicImage;

/// Stretch `img` to exactly `width × height` with Catmull-Rom (bicubic) filtering.
///
/// Aspect ratio is not preserved.
pub fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    img.resize_exact(width, height, FilterType::CatmullRom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_resize_stretches_to_exact_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 10, Rgba([0, 0, 255, 255])));

        let resized = resize_exact(&img, 300, 300);

        assert_eq!(resized.dimensions(), (300, 300));
        let Rgba([r, g, b, _]) = resized.get_pixel(150, 150);
        assert!(r <= 1 && g <= 1 && b >= 254, "{:?}", (r, g, b));
    }

    #[test]
    fn test_resize_is_deterministic() {
        let mut src = RgbaImage::new(16, 16);
        for (x, y, px) in src.enumerate_pixels_mut() {
            *px = Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255]);
        }
        let img = DynamicImage::ImageRgba8(src);

        let a = resize_exact(&img, 300, 300);
        let b = resize_exact(&img, 300, 300);

        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}
