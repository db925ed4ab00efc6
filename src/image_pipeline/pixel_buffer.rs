//! # Pixel Buffer
//!
//! A validated RGBA8 grid. Every stage of the image pipeline takes and returns this type,
//! so the `width * height * 4` invariant is checked once, at construction.

use image::RgbaImage;

use super::error::PipelineError;

/// Number of bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A width × height grid of RGBA bytes in row-major order.
///
/// # Invariants
/// * `width > 0` and `height > 0`
/// * `data.len() == width * height * 4`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a pixel buffer from raw RGBA bytes.
    ///
    /// # Arguments
    /// * `width` - Width in pixels, must be non-zero
    /// * `height` - Height in pixels, must be non-zero
    /// * `data` - Row-major RGBA bytes
    ///
    /// # Returns
    /// The buffer, or a descriptive error if the dimensions and byte length disagree
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::ZeroDimension { width, height });
        }

        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(PipelineError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a buffer where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, PipelineError> {
        let pixel_count = width as usize * height as usize;
        let data = rgba.repeat(pixel_count);
        Self::new(width, height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw row-major RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterates over pixels as `[r, g, b, a]` slices in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }

    /// Mutable pixel iterator in row-major order.
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data.chunks_exact_mut(CHANNELS)
    }

    /// Gets the pixel at column `x`, row `y`.
    ///
    /// # Returns
    /// `None` if the coordinate lies outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[start..start + CHANNELS]);
        Some(rgba)
    }

    /// Number of pixels whose alpha is above zero.
    pub fn opaque_count(&self) -> usize {
        self.pixels().filter(|pixel| pixel[3] > 0).count()
    }
}

impl From<RgbaImage> for PixelBuffer {
    /// `RgbaImage` always has a matching byte length. Only its dimensions may be zero,
    /// and decoders never produce that.
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl From<PixelBuffer> for RgbaImage {
    fn from(buffer: PixelBuffer) -> Self {
        let PixelBuffer {
            width,
            height,
            data,
        } = buffer;
        // Length is guaranteed by the PixelBuffer invariant.
        RgbaImage::from_raw(width, height, data)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let err = PixelBuffer::new(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::ZeroDimension { width: 0, height: 4 }));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        match err {
            PipelineError::LengthMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 15);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let mut data = vec![0; 2 * 2 * 4];
        // Pixel (1, 1) is the last one.
        data[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let buffer = PixelBuffer::new(2, 2, data).unwrap();

        assert_eq!(buffer.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(buffer.pixel(0, 1), Some([0, 0, 0, 0]));
        assert_eq!(buffer.pixel(2, 0), None);
    }

    #[test]
    fn converts_through_rgba_image() {
        let buffer = PixelBuffer::filled(3, 2, [10, 20, 30, 255]).unwrap();
        let image: RgbaImage = buffer.clone().into();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(PixelBuffer::from(image), buffer);
    }
}
