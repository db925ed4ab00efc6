//! Per-frame scratch storage owned by the render loop.

use crate::engine_state::rendering::vertex::InstanceRaw;

/// Reusable allocations for one frame. Cleared, never shrunk.
#[derive(Debug, Default)]
pub struct ScratchArena {
    /// Packed instance data waiting to be uploaded
    pub instances: Vec<InstanceRaw>,
}

impl ScratchArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every buffer, keeping capacity for the next frame.
    pub fn begin_frame(&mut self) -> &mut Self {
        self.instances.clear();
        self
    }

    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
