//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an RGBA
//! image whose alpha channel feeds the [`AlphaSampler`](crate::AlphaSampler).

use image::RgbaImage;

use crate::types::HullError;

/// Decode raw image bytes into RGBA.
///
/// Formats without an alpha channel decode as fully opaque.
///
/// # Errors
///
/// Returns [`HullError::EmptyInput`] if `bytes` is empty.
/// Returns [`HullError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, HullError> {
    if bytes.is_empty() {
        return Err(HullError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
