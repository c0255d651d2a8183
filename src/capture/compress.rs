//! Photo compression — decode, downscale to a maximum width, JPEG re-encode.
//!
//! Camera photos are routinely 3–12 MP. The remote endpoint only needs
//! enough detail to see the hairline, so every photo is shrunk before
//! sizing and upload. Aspect ratio is preserved and images are never
//! upscaled.

use super::EncodedImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType};
use thiserror::Error;

/// Error type for photo compression. Neither variant is retriable.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The source could not be decoded (bad base64 or unknown/corrupt image).
    #[error("Failed to decode photo: {0}")]
    Decode(String),

    /// The target surface could not be created or written.
    #[error("Failed to render compressed photo: {0}")]
    Render(String),
}

/// Compress one photo.
///
/// The result is scaled so its width does not exceed `max_width` and
/// re-encoded as JPEG at `quality` (1–100).
pub fn compress_image(
    source: &EncodedImage,
    max_width: u32,
    quality: u8,
) -> Result<EncodedImage, CompressError> {
    let start = std::time::Instant::now();

    let bytes = source
        .decode_bytes()
        .map_err(|e| CompressError::Decode(format!("invalid base64: {}", e)))?;
    let img = image::load_from_memory(&bytes).map_err(|e| CompressError::Decode(e.to_string()))?;

    let (src_w, src_h) = (img.width(), img.height());
    let (dst_w, dst_h) = target_dimensions((src_w, src_h), max_width);
    if dst_w == 0 || dst_h == 0 {
        return Err(CompressError::Render(format!(
            "cannot create {}x{} surface from {}x{} source",
            dst_w, dst_h, src_w, src_h
        )));
    }

    let resized = if (dst_w, dst_h) == (src_w, src_h) {
        img
    } else {
        img.resize_exact(dst_w, dst_h, FilterType::Triangle)
    };

    let jpeg = encode_jpeg(&resized, quality)?;
    let out = EncodedImage::from_bytes(&jpeg);

    log::info!(
        "[COMPRESS] {}x{} → {}x{} q{}: {} → {} bytes in {}ms",
        src_w,
        src_h,
        dst_w,
        dst_h,
        quality,
        bytes.len(),
        jpeg.len(),
        start.elapsed().as_millis()
    );
    Ok(out)
}

/// Target size for a `source` image constrained to `max_width`.
///
/// Width is capped, height follows the source aspect ratio, and images
/// already narrower than the cap are left alone.
pub(crate) fn target_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= max_width {
        return (w, h);
    }
    let scale = max_width as f64 / w as f64;
    let new_h = (h as f64 * scale).round() as u32;
    (max_width, new_h.max(1).min(h))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
    // JPEG has no alpha channel — flatten to RGB first.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CompressError::Render(e.to_string()))?;
    Ok(buf)
}
