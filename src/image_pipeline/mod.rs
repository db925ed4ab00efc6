//! # Image Pipeline
//!
//! Turns encoded image bytes into a small RGBA grid ready for voxelization.
//!
//! ## Stages
//!
//! * `loader` - decodes file bytes into a [`PixelBuffer`]
//! * `processor` - white suppression, quantization, contrast, resampling, alpha threshold
//!
//! Every stage is a pure function over [`PixelBuffer`], so a failed decode never touches
//! whatever the caller is already showing.

pub mod error;
pub mod loader;
pub mod pixel_buffer;
pub mod processor;

pub use error::PipelineError;
pub use pixel_buffer::PixelBuffer;
pub use processor::{process, ProcessOptions};
