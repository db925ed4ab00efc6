//! # Block Descriptor
//!
//! One positioned, colored block derived from one surviving pixel.

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

/// A single voxel placed in world space.
///
/// Descriptors are created once per processed pixel with non-zero alpha and never change.
/// Only the rendered transform of the instance built from them moves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Column of the source pixel
    pub column: u32,
    /// Row of the source pixel
    pub row: u32,
    /// World position after recentering and scaling
    pub position: [f32; 3],
    /// RGBA color normalized to `0.0..=1.0`
    pub color: [f32; 4],
    /// Grid distance from the image center, normalized by half the width.
    /// Only used to stagger the entrance animation.
    pub distance_from_center: f32,
}

impl BlockDescriptor {
    /// The world position as a vector.
    pub fn position_vec(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }
}
