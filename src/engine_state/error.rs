//! Errors raised while drawing a frame.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no GPU buffer named '{0}'")]
    MissingBuffer(&'static str),

    #[error("write of {size} bytes at offset {offset} overflows buffer '{name}' ({capacity} bytes)")]
    BufferOverflow {
        name: &'static str,
        offset: u64,
        size: u64,
        capacity: u64,
    },

    #[error("could not acquire the next surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
