//! Error types for the image pipeline.

use thiserror::Error;

/// Errors raised while decoding or processing an image.
///
/// None of these are retried. The caller keeps whatever scene was already on screen
/// and may resubmit the file.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The buffer has a zero width or height.
    #[error("pixel buffer has zero dimension: {width}x{height}")]
    ZeroDimension {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The byte length does not match `width * height * 4`.
    #[error("pixel buffer length mismatch for {width}x{height}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// Processing options that cannot produce a meaningful result.
    #[error("invalid processing options: {0}")]
    InvalidOptions(String),

    /// The bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}
