//! Screenshot downscaling and JPEG encoding.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};

/// Largest width or height sent to the model.
pub const MAX_DIMENSION: u32 = 800;

/// Encode error.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a screenshot, shrink it to fit `MAX_DIMENSION`, and return it as
/// a base64 JPEG `data:` URL.
///
/// # Errors
/// Returns error if the bytes are not a supported image.
pub fn to_jpeg_data_url(raw: &[u8]) -> Result<String, EncodeError> {
    let img = image::load_from_memory(raw)?;
    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffered = Cursor::new(Vec::new());
    rgb.write_to(&mut buffered, ImageFormat::Jpeg)?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(buffered.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn decode(url: &str) -> DynamicImage {
        let b64 = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = BASE64.decode(b64).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap()
    }

    #[test]
    fn test_large_screenshot_is_downscaled() {
        let url = to_jpeg_data_url(&png(1600, 900)).unwrap();
        assert_eq!(decode(&url).dimensions(), (800, 450));
    }

    #[test]
    fn test_small_screenshot_keeps_size() {
        let url = to_jpeg_data_url(&png(320, 200)).unwrap();
        assert_eq!(decode(&url).dimensions(), (320, 200));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(to_jpeg_data_url(b"not an image").is_err());
    }
}
