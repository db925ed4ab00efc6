//! Owns the voxel render pipeline and executes the frame's single render pass.

use wgpu::{Device, Queue, RenderPipeline, Surface, SurfaceConfiguration, TextureFormat};

use super::{
    cube,
    texture::DepthTexture,
    vertex::{CubeVertex, InstanceRaw},
    CUBE_INDEX_BUFFER_NAME, CUBE_VERTEX_BUFFER_NAME, INSTANCE_BUFFER_NAME,
};
use crate::engine_state::{
    buffer_state::BufferState, camera_state::CAMERA_BUFFER_NAME, error::RenderError,
    voxels::layout::BLOCK_SIZE,
};

/// Light grey backdrop.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.86,
    g: 0.86,
    b: 0.88,
    a: 1.0,
};

pub struct PipelineManager {
    render_pipeline: RenderPipeline,
    camera_bind_group: wgpu::BindGroup,
    depth_texture: DepthTexture,
    index_count: u32,
}

impl PipelineManager {
    /// Builds the pipeline and uploads the shared cube mesh.
    ///
    /// The camera buffer must already exist in `buffer_state`.
    pub fn new(
        device: &Device,
        config: &SurfaceConfiguration,
        texture_format: TextureFormat,
        buffer_state: &mut BufferState,
    ) -> Result<Self, RenderError> {
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer_state.get_buffer(CAMERA_BUFFER_NAME)?.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let (vertices, indices) = cube::cube_mesh(BLOCK_SIZE);
        buffer_state.create_buffer_init(
            device,
            CUBE_VERTEX_BUFFER_NAME,
            &wgpu::util::BufferInitDescriptor {
                label: Some(CUBE_VERTEX_BUFFER_NAME),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );
        buffer_state.create_buffer_init(
            device,
            CUBE_INDEX_BUFFER_NAME,
            &wgpu::util::BufferInitDescriptor {
                label: Some(CUBE_INDEX_BUFFER_NAME),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Voxel Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Voxel Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/voxel.wgsl").into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Voxel Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[CubeVertex::desc(), InstanceRaw::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            render_pipeline,
            camera_bind_group,
            depth_texture: DepthTexture::new(device, config, "voxel_depth_texture"),
            index_count: indices.len() as u32,
        })
    }

    /// Clears the frame and draws `instance_count` cubes from the instance buffer.
    ///
    /// With zero instances only the clear runs.
    pub fn render(
        &self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
        buffer_state: &BufferState,
        instance_count: u32,
    ) -> Result<(), RenderError> {
        let frame = surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.create_command_encoder(&Default::default());

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("voxel_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if instance_count > 0 {
                rpass.set_pipeline(&self.render_pipeline);
                rpass.set_bind_group(0, &self.camera_bind_group, &[]);
                rpass.set_vertex_buffer(0, buffer_state.get_buffer(CUBE_VERTEX_BUFFER_NAME)?.slice(..));
                rpass.set_vertex_buffer(1, buffer_state.get_buffer(INSTANCE_BUFFER_NAME)?.slice(..));
                rpass.set_index_buffer(
                    buffer_state.get_buffer(CUBE_INDEX_BUFFER_NAME)?.slice(..),
                    wgpu::IndexFormat::Uint16,
                );
                rpass.draw_indexed(0..self.index_count, 0, 0..instance_count);
            }
        }

        queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }

    /// Recreates the depth texture for a resized surface.
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = DepthTexture::new(device, config, "voxel_depth_texture");
    }
}
