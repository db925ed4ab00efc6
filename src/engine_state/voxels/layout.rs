//! # Voxel Layout Builder
//!
//! Converts a processed [`PixelBuffer`] into an ordered [`VoxelInstanceSet`].
//!
//! The sculpture lies on the XZ plane: image columns map to X, image rows map to Z, and
//! every block starts at `y = 0`. Coordinates are recentered so the image middle sits at
//! the world origin.

use serde::Serialize;

use crate::image_pipeline::PixelBuffer;

use super::descriptor::BlockDescriptor;

/// World-space edge length of one block.
pub const BLOCK_SIZE: f32 = 1.0;

/// An ordered set of block descriptors.
///
/// Order is row-major over the source pixels and is stable for the lifetime of one loaded
/// image. The index is the join key between render slot, picking proxy and physics body.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VoxelInstanceSet {
    /// Edge length used when placing the blocks
    pub block_size: f32,
    /// Descriptors in row-major pixel order
    pub blocks: Vec<BlockDescriptor>,
}

impl VoxelInstanceSet {
    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when every pixel was transparent.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over descriptors in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, BlockDescriptor> {
        self.blocks.iter()
    }
}

/// Builds the voxel layout for a processed image.
///
/// # Arguments
/// * `buffer` - A processed pixel buffer
/// * `block_size` - World-space size of one block
///
/// # Returns
/// One descriptor per pixel with alpha above zero, in row-major order. A fully
/// transparent buffer yields an empty set.
pub fn build_layout(buffer: &PixelBuffer, block_size: f32) -> VoxelInstanceSet {
    let width = buffer.width();
    let center_x = width as f32 / 2.0;
    let center_y = buffer.height() as f32 / 2.0;

    let blocks = buffer
        .pixels()
        .enumerate()
        .filter(|(_, pixel)| pixel[3] > 0)
        .map(|(index, pixel)| {
            let column = index as u32 % width;
            let row = index as u32 / width;
            let (j, i) = (column as f32, row as f32);

            BlockDescriptor {
                column,
                row,
                position: [(j - center_x) * block_size, 0.0, (i - center_y) * block_size],
                color: [
                    pixel[0] as f32 / 255.0,
                    pixel[1] as f32 / 255.0,
                    pixel[2] as f32 / 255.0,
                    pixel[3] as f32 / 255.0,
                ],
                distance_from_center: ((center_x - j).powi(2) + (center_y - i).powi(2)).sqrt()
                    / center_x,
            }
        })
        .collect::<Vec<_>>();

    log::info!(
        "Built voxel layout with {} blocks from {}x{} pixels",
        blocks.len(),
        width,
        buffer.height()
    );

    VoxelInstanceSet { block_size, blocks }
}
