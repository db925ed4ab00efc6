//! # Image Processor
//!
//! Reduces an arbitrary RGBA image to a small, palette-limited grid that can be turned
//! into voxels. The stages run in a fixed order:
//!
//! 1. White-ish pixels become transparent (treated as background)
//! 2. Each channel is floored onto a coarse palette
//! 3. Each channel is multiplied by a contrast factor and clamped
//! 4. The image is resampled with nearest-neighbor so its longer side is the target size
//! 5. Alpha below a near-opaque cutoff becomes 0
//!
//! Suppression runs before resampling so background pixels cannot bleed into edges.
//! Thresholding runs after, removing half-covered pixels at the silhouette.

use image::{imageops, imageops::FilterType, RgbaImage};
use serde::{Deserialize, Serialize};

use super::{error::PipelineError, pixel_buffer::PixelBuffer};

/// Longest output side in pixels.
pub const DEFAULT_TARGET_SIZE: u32 = 16;
/// Approximate palette size per channel is `sqrt` of this.
pub const DEFAULT_COLOR_COUNT: u32 = 16;
/// Channel average above which a low-spread pixel counts as white.
pub const DEFAULT_WHITE_THRESHOLD: u8 = 240;
/// Maximum channel spread for a pixel to count as white.
pub const DEFAULT_WHITE_TOLERANCE: u8 = 16;
/// With 16 colors the top palette level is 192, and 192 * 1.33 clamps to 255.
/// The levels {0, 64, 128, 192} become {0, 85, 170, 255}, which re-quantize to themselves.
pub const DEFAULT_CONTRAST: f32 = 1.33;
/// Alpha values below this become fully transparent.
pub const DEFAULT_ALPHA_CUTOFF: u8 = 255;

/// Tunables for [`process`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Longest side of the output, in pixels
    pub size: u32,
    /// Target color count
    pub colors: u32,
    /// Channel average above which a pixel may be white
    pub white_threshold: u8,
    /// Channel spread below which a pixel may be white
    pub white_tolerance: u8,
    /// Contrast multiplier, applied after quantization
    pub contrast: f32,
    /// Minimum alpha that survives the final threshold
    pub alpha_cutoff: u8,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_TARGET_SIZE,
            colors: DEFAULT_COLOR_COUNT,
            white_threshold: DEFAULT_WHITE_THRESHOLD,
            white_tolerance: DEFAULT_WHITE_TOLERANCE,
            contrast: DEFAULT_CONTRAST,
            alpha_cutoff: DEFAULT_ALPHA_CUTOFF,
        }
    }
}

impl ProcessOptions {
    /// Checks that the options can produce a non-degenerate result.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.size == 0 {
            return Err(PipelineError::InvalidOptions(
                "target size must be at least 1".to_string(),
            ));
        }
        if self.colors == 0 {
            return Err(PipelineError::InvalidOptions(
                "color count must be at least 1".to_string(),
            ));
        }
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(PipelineError::InvalidOptions(format!(
                "contrast must be a positive finite number, got {}",
                self.contrast
            )));
        }
        Ok(())
    }

    /// Width of one palette step: `floor(256 / sqrt(colors))`, never below 1.
    pub fn quantization_step(&self) -> u32 {
        let step = (256.0 / (self.colors as f64).sqrt()).floor() as u32;
        step.max(1)
    }
}

/// Runs the full processing pipeline over `source`.
///
/// # Arguments
/// * `source` - A decoded RGBA buffer of any size
/// * `options` - Processing tunables, usually [`ProcessOptions::default`]
///
/// # Returns
/// A new buffer whose longer side is exactly `options.size`
///
/// # Errors
/// [`PipelineError::InvalidOptions`] if `options` fail validation
pub fn process(source: &PixelBuffer, options: &ProcessOptions) -> Result<PixelBuffer, PipelineError> {
    options.validate()?;

    let mut working = source.clone();
    suppress_white(&mut working, options.white_threshold, options.white_tolerance);
    quantize(&mut working, options.quantization_step());
    boost_contrast(&mut working, options.contrast);

    let mut output = resample(working, options.size)?;
    threshold_alpha(&mut output, options.alpha_cutoff);

    log::debug!(
        "Processed {}x{} image into {}x{} with {} opaque pixels",
        source.width(),
        source.height(),
        output.width(),
        output.height(),
        output.opaque_count()
    );

    Ok(output)
}

/// Makes white-ish pixels transparent.
pub fn suppress_white(buffer: &mut PixelBuffer, threshold: u8, tolerance: u8) {
    for pixel in buffer.pixels_mut() {
        let (r, g, b) = (pixel[0] as u32, pixel[1] as u32, pixel[2] as u32);
        let average = (r + g + b) / 3;
        let spread = r.max(g).max(b) - r.min(g).min(b);

        if average > threshold as u32 && spread < tolerance as u32 {
            pixel[3] = 0;
        }
    }
}

/// Floors each color channel onto a multiple of `step`. Alpha is left untouched.
pub fn quantize(buffer: &mut PixelBuffer, step: u32) {
    let step = step.max(1);
    for pixel in buffer.pixels_mut() {
        for channel in &mut pixel[..3] {
            *channel = ((*channel as u32 / step) * step).min(255) as u8;
        }
    }
}

/// Multiplies each color channel by `factor`, clamped to 255.
pub fn boost_contrast(buffer: &mut PixelBuffer, factor: f32) {
    for pixel in buffer.pixels_mut() {
        for channel in &mut pixel[..3] {
            *channel = (*channel as f32 * factor).floor().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Output dimensions for a `width` × `height` source fit into `size`.
///
/// The longer side becomes `size`, and the shorter side is scaled by the same ratio.
/// Small sources are scaled up.
pub fn target_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let ratio = size as f64 / width.max(height) as f64;
    let scale = |side: u32| ((side as f64 * ratio).round() as u32).clamp(1, size);
    (scale(width), scale(height))
}

/// Resamples `buffer` into the target size with nearest-neighbor, without smoothing.
pub fn resample(buffer: PixelBuffer, size: u32) -> Result<PixelBuffer, PipelineError> {
    let (width, height) = target_dimensions(buffer.width(), buffer.height(), size);
    if (width, height) == (buffer.width(), buffer.height()) {
        return Ok(buffer);
    }

    let bitmap: RgbaImage = buffer.into();
    let scaled = imageops::resize(&bitmap, width, height, FilterType::Nearest);
    PixelBuffer::new(width, height, scaled.into_raw())
}

/// Zeroes any alpha below `cutoff`.
pub fn threshold_alpha(buffer: &mut PixelBuffer, cutoff: u8) {
    for pixel in buffer.pixels_mut() {
        if pixel[3] < cutoff {
            pixel[3] = 0;
        }
    }
}

/// Upscales a processed buffer with nearest-neighbor, for side-by-side previews.
pub fn upscale_preview(
    processed: &PixelBuffer,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::ZeroDimension { width, height });
    }
    let bitmap: RgbaImage = processed.clone().into();
    let scaled = imageops::resize(&bitmap, width, height, FilterType::Nearest);
    PixelBuffer::new(width, height, scaled.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_step_matches_palette_size() {
        let options = ProcessOptions::default();
        assert_eq!(options.quantization_step(), 64);

        let options = ProcessOptions {
            colors: 32,
            ..Default::default()
        };
        assert_eq!(options.quantization_step(), 45);
    }

    #[test]
    fn rejects_invalid_options() {
        let source = PixelBuffer::filled(4, 4, [10, 10, 10, 255]).unwrap();
        for options in [
            ProcessOptions {
                size: 0,
                ..Default::default()
            },
            ProcessOptions {
                colors: 0,
                ..Default::default()
            },
            ProcessOptions {
                contrast: f32::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                process(&source, &options),
                Err(PipelineError::InvalidOptions(_))
            ));
        }
    }

    #[test]
    fn white_pixels_become_transparent() {
        let mut buffer = PixelBuffer::new(
            3,
            1,
            vec![
                250, 250, 250, 255, // white
                250, 200, 250, 255, // bright but tinted
                10, 10, 10, 255, // dark gray
            ],
        )
        .unwrap();

        suppress_white(&mut buffer, DEFAULT_WHITE_THRESHOLD, DEFAULT_WHITE_TOLERANCE);

        assert_eq!(buffer.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(buffer.pixel(1, 0).unwrap()[3], 255);
        assert_eq!(buffer.pixel(2, 0).unwrap()[3], 255);
    }

    #[test]
    fn quantize_floors_to_step_and_keeps_alpha() {
        let mut buffer = PixelBuffer::new(1, 1, vec![255, 63, 130, 77]).unwrap();
        quantize(&mut buffer, 64);
        assert_eq!(buffer.pixel(0, 0), Some([192, 0, 128, 77]));
    }

    #[test]
    fn contrast_clamps_at_255() {
        let mut buffer = PixelBuffer::new(1, 1, vec![192, 128, 64, 255]).unwrap();
        boost_contrast(&mut buffer, DEFAULT_CONTRAST);
        assert_eq!(buffer.pixel(0, 0), Some([255, 170, 85, 255]));
    }

    #[test]
    fn target_dimensions_preserve_aspect() {
        assert_eq!(target_dimensions(64, 32, 16), (16, 8));
        assert_eq!(target_dimensions(30, 100, 16), (5, 16));
        assert_eq!(target_dimensions(1000, 1, 16), (16, 1));
        assert_eq!(target_dimensions(8, 12, 16), (11, 16));
        assert_eq!(target_dimensions(16, 16, 16), (16, 16));
    }

    #[test]
    fn small_sources_are_scaled_up_to_target() {
        let options = ProcessOptions::default();

        let square = PixelBuffer::filled(4, 4, [255, 0, 0, 255]).unwrap();
        let output = process(&square, &options).unwrap();
        assert_eq!((output.width(), output.height()), (16, 16));
        assert_eq!(output.opaque_count(), 256);

        let strip = PixelBuffer::filled(8, 2, [0, 0, 255, 255]).unwrap();
        let output = process(&strip, &options).unwrap();
        assert_eq!((output.width(), output.height()), (16, 4));
    }

    #[test]
    fn upscaling_repeats_source_pixels() {
        let mut buffer = PixelBuffer::filled(4, 4, [0, 0, 0, 0]).unwrap();
        buffer.pixels_mut().nth(4 + 1).unwrap().copy_from_slice(&[255, 0, 0, 255]);

        let output = resample(buffer, 16).unwrap();
        assert_eq!(output.opaque_count(), 16);
        assert_eq!(output.pixel(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(output.pixel(7, 7), Some([255, 0, 0, 255]));
        assert_eq!(output.pixel(8, 4).unwrap()[3], 0);
    }

    #[test]
    fn output_fills_target_and_keeps_ratio() {
        let options = ProcessOptions::default();
        for (width, height) in [(17, 16), (100, 37), (3, 90), (256, 256), (5, 5)] {
            let source = PixelBuffer::filled(width, height, [0, 0, 255, 255]).unwrap();
            let output = process(&source, &options).unwrap();

            assert_eq!(output.width().max(output.height()), options.size);

            // Aspect ratio within one pixel of rounding, measured off the longer side.
            let (short_out, expected_short) = if width >= height {
                (output.height(), output.width() as f64 * height as f64 / width as f64)
            } else {
                (output.width(), output.height() as f64 * width as f64 / height as f64)
            };
            assert!(
                (short_out as f64 - expected_short).abs() <= 1.0,
                "{width}x{height} became {}x{}",
                output.width(),
                output.height()
            );
        }
    }

    #[test]
    fn alpha_threshold_binarizes_alpha() {
        let mut buffer = PixelBuffer::new(2, 1, vec![1, 2, 3, 254, 1, 2, 3, 255]).unwrap();
        threshold_alpha(&mut buffer, DEFAULT_ALPHA_CUTOFF);
        assert_eq!(buffer.pixel(0, 0).unwrap()[3], 0);
        assert_eq!(buffer.pixel(1, 0).unwrap()[3], 255);
    }

    #[test]
    fn processed_output_is_a_fixed_point() {
        let source = PixelBuffer::filled(16, 16, [170, 85, 255, 255]).unwrap();
        let options = ProcessOptions::default();

        let once = process(&source, &options).unwrap();
        let twice = process(&once, &options).unwrap();

        assert_eq!(once, source);
        assert_eq!(twice, once);
    }

    #[test]
    fn upscale_preview_repeats_pixels() {
        let small = PixelBuffer::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let preview = upscale_preview(&small, 4, 2).unwrap();

        assert_eq!(preview.pixel(0, 1), Some([255, 0, 0, 255]));
        assert_eq!(preview.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(preview.pixel(3, 1), Some([0, 0, 255, 255]));
    }
}
