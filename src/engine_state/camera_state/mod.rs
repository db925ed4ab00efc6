//! # Camera State Management
//!
//! Owns the orbit camera, its projection and controller, and the GPU uniform buffer that
//! carries the view-projection matrix to the shader. Also turns cursor positions into
//! world rays for block picking.

use cgmath::{Deg, Vector2};
use wgpu::{Device, Queue};

use super::{buffer_state::BufferState, error::RenderError, scene::picking::Ray};

pub mod camera;

/// Name of the GPU buffer used for camera uniform data
pub const CAMERA_BUFFER_NAME: &str = "camera_buffer";

const ORBIT_SENSITIVITY: f32 = 0.005;
const ZOOM_SPEED: f32 = 1.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

pub struct CameraState {
    pub camera: camera::Camera,
    pub projection: camera::Projection,
    pub camera_uniform: camera::CameraUniform,
    pub camera_controller: camera::CameraController,
    viewport: Vector2<f32>,
    dirty: bool,
}

impl CameraState {
    /// Creates the camera at its start position and uploads the first uniform.
    pub fn new(device: &Device, buffer_state: &mut BufferState, width: u32, height: u32) -> Self {
        let camera = camera::Camera::default();
        let projection = camera::Projection::new(
            width,
            height,
            Deg(camera::FIELD_OF_VIEW_DEGREES),
            Z_NEAR,
            Z_FAR,
        );

        let mut camera_uniform = camera::CameraUniform::default();
        camera_uniform.update_view_proj_and_pos(&camera, &projection);

        buffer_state.create_buffer_init(
            device,
            CAMERA_BUFFER_NAME,
            &wgpu::util::BufferInitDescriptor {
                label: Some(CAMERA_BUFFER_NAME),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        Self {
            camera,
            projection,
            camera_uniform,
            camera_controller: camera::CameraController::new(ORBIT_SENSITIVITY, ZOOM_SPEED),
            viewport: Vector2::new(width.max(1) as f32, height.max(1) as f32),
            dirty: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.viewport = Vector2::new(width.max(1) as f32, height.max(1) as f32);
        self.dirty = true;
    }

    /// Applies pending controller input and re-uploads the uniform if anything changed.
    pub fn update(&mut self, queue: &Queue, buffer_state: &mut BufferState) -> Result<(), RenderError> {
        if self.camera_controller.has_updates() {
            self.camera.apply_controller(&mut self.camera_controller);
            self.dirty = true;
        }
        if !self.dirty {
            return Ok(());
        }

        self.camera_uniform
            .update_view_proj_and_pos(&self.camera, &self.projection);
        buffer_state.write_buffer(
            queue,
            CAMERA_BUFFER_NAME,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        )?;
        self.dirty = false;
        Ok(())
    }

    /// World ray under the cursor at `screen`, in physical pixels.
    pub fn ray_through(&self, screen: Vector2<f32>) -> Option<Ray> {
        camera::screen_ray(&self.camera, &self.projection, screen, self.viewport)
    }
}
