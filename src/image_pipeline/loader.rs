//! Decodes image file bytes into a [`PixelBuffer`].

use image::ImageFormat;

use super::{error::PipelineError, pixel_buffer::PixelBuffer};

/// MIME type reported when the format cannot be guessed from the bytes.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Decodes an encoded image (PNG, JPEG, GIF, WebP, BMP) into an RGBA pixel buffer.
///
/// # Arguments
/// * `bytes` - The complete file contents
///
/// # Returns
/// The decoded buffer, or [`PipelineError::Decode`] for corrupt or unsupported input
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, PipelineError> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();
    log::debug!("Decoded {}x{} image", rgba.width(), rgba.height());

    // Zero-sized images are technically decodable for some formats.
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::ZeroDimension { width, height });
    }

    Ok(PixelBuffer::from(rgba))
}

/// Guesses a MIME type from the file's magic bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format: ImageFormat| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME_TYPE)
}
