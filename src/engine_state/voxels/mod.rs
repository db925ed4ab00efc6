//! # Voxels
//!
//! * `descriptor` - one positioned, colored block per surviving pixel
//! * `layout` - builds the ordered descriptor set for a processed image

pub mod descriptor;
pub mod layout;
