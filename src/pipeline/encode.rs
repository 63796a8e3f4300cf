//! Image encoding: `DynamicImage` → JPEG bytes, and Base64 for JSON output.
//!
//! pdfium renders RGBA; JPEG has no alpha channel, so pages are flattened to
//! RGB before encoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode a rendered page as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    debug!("Encoded image → {} bytes JPEG", buf.len());
    Ok(buf)
}

/// Standard Base64 (with padding).
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a Base64 payload. A `data:<mime>;base64,` prefix is accepted and
/// dropped, and surrounding whitespace is ignored.
pub fn from_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let data = data.trim();
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    STANDARD.decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 128])));
        let data = encode_jpeg(&img, 85).expect("encode should succeed");
        // JPEG SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn lower_quality_is_smaller() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255])
        }));
        let hi = encode_jpeg(&img, 95).unwrap();
        let lo = encode_jpeg(&img, 10).unwrap();
        assert!(lo.len() < hi.len());
    }

    #[test]
    fn base64_accepts_data_uri() {
        assert_eq!(from_base64("data:application/pdf;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(from_base64(" aGVsbG8=\n").unwrap(), b"hello");
        assert_eq!(to_base64(b"hello"), "aGVsbG8=");
        assert!(from_base64("not base64!").is_err());
    }
}
