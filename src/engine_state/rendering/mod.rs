//! Rendering system for the voxel sculpture.
//!
//! Every block is one instance of a shared cube mesh. The scene packs model matrices and
//! colors into a scratch vector each frame. The renderer uploads it into a growable
//! instance buffer and issues a single instanced draw.

use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use pipeline_manager::PipelineManager;

use super::{buffer_state::BufferState, error::RenderError};

pub mod cube;
mod pipeline_manager;
mod texture;
pub mod vertex;

pub const CUBE_VERTEX_BUFFER_NAME: &str = "cube_vertex_buffer";
pub const CUBE_INDEX_BUFFER_NAME: &str = "cube_index_buffer";
pub const INSTANCE_BUFFER_NAME: &str = "instance_buffer";

/// Owns the surface and the voxel pipeline.
pub struct VoxelRenderer {
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
    pipeline_manager: PipelineManager,
}

impl VoxelRenderer {
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: &Device,
        buffer_state: &mut BufferState,
    ) -> Result<Self, RenderError> {
        let pipeline_manager =
            PipelineManager::new(device, &surface_config, surface_config.format, buffer_state)?;

        Ok(Self {
            surface,
            surface_config,
            pipeline_manager,
        })
    }

    /// Reconfigures the surface and depth buffer. Zero-sized windows are ignored.
    pub fn resize_surface(&mut self, device: &Device, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(device, &self.surface_config);
        self.pipeline_manager.resize(device, &self.surface_config);
    }

    /// Uploads `instance_bytes` and draws one frame.
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        buffer_state: &mut BufferState,
        instance_bytes: &[u8],
        instance_count: u32,
    ) -> Result<(), RenderError> {
        if instance_count > 0 {
            buffer_state.write_or_grow(
                device,
                queue,
                INSTANCE_BUFFER_NAME,
                wgpu::BufferUsages::VERTEX,
                instance_bytes,
            )?;
        }

        match self
            .pipeline_manager
            .render(&self.surface, device, queue, buffer_state, instance_count)
        {
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface lost, reconfiguring");
                self.surface.configure(device, &self.surface_config);
                Ok(())
            }
            other => other,
        }
    }
}
