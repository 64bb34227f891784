//! Image preprocessing for single-example inference.
//!
//! Decodes image bytes (PNG/JPEG/BMP/GIF), converts to grayscale, resizes to
//! the network's input dimensions, and applies the same normalization as the
//! training data.

use crate::data::dataset::Normalize;
use crate::error::Result;

/// Returns a flat row-major vector of length `width * height`.
///
/// MNIST-style data is light-on-dark; set `invert` for dark-on-light inputs
/// such as scanned drawings.
pub fn image_bytes_to_grayscale_input(
    bytes: &[u8],
    width: u32,
    height: u32,
    normalize: Normalize,
    invert: bool,
) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray
        .pixels()
        .map(|p| {
            let raw = if invert { 255 - p.0[0] } else { p.0[0] };
            normalize.pixel(raw)
        })
        .collect())
}

/// Reads `path` and runs [`image_bytes_to_grayscale_input`].
pub fn load_grayscale_input(
    path: &str,
    width: u32,
    height: u32,
    normalize: Normalize,
    invert: bool,
) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path)?;
    image_bytes_to_grayscale_input(&bytes, width, height, normalize, invert)
}
