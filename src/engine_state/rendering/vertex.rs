//! Vertex and instance data layouts for the voxel pipeline.
//!
//! Two vertex buffers feed the pipeline: the shared cube mesh, stepped per vertex, and
//! the packed instance data, stepped per instance.

use cgmath::Matrix4;

/// A vertex of the shared cube mesh.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    /// Position relative to the cube center
    pub position: [f32; 3],
    /// Outward face normal
    pub normal: [f32; 3],
}

impl CubeVertex {
    /// Returns the vertex buffer layout for the cube mesh.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (vec3<f32>)
    /// - `location = 1`: normal (vec3<f32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-instance data: a model matrix and an RGBA color.
///
/// # Memory Layout
/// - Model: 4x [f32; 4] columns (64 bytes)
/// - Color: [f32; 4] (16 bytes)
///
/// Total size: 80 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
    /// Normalized RGBA color
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: Matrix4<f32>, color: [f32; 4]) -> Self {
        Self {
            model: model.into(),
            color,
        }
    }

    /// Returns the vertex buffer layout for instance data.
    ///
    /// The matrix takes four consecutive locations since a vertex attribute holds at most
    /// a vec4.
    ///
    /// # Shader Attributes
    /// - `location = 2..=5`: model matrix columns (vec4<f32>)
    /// - `location = 6`: color (vec4<f32>)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const COLUMN: wgpu::BufferAddress = std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress;

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: COLUMN,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: COLUMN * 2,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: COLUMN * 3,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: COLUMN * 4,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
