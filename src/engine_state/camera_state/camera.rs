//! # Camera Implementation
//!
//! - `Camera`: an orbit camera looking at a fixed target
//! - `Projection`: perspective projection settings
//! - `CameraController`: accumulates orbit and zoom input between frames
//! - `CameraUniform`: packed camera data for the shader
//! - `screen_ray`: unprojects a cursor position into a world ray for picking

use cgmath::*;
use std::f32::consts::FRAC_PI_2;

use crate::engine_state::scene::picking::{screen_to_ndc, Ray};

/// Transformation matrix to convert from OpenGL's coordinate system to WGPU's.
///
/// NDC depth in wgpu runs from 0 to 1 instead of -1 to 1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Where the camera starts.
pub const CAMERA_POSITION: Point3<f32> = Point3::new(0.0, 15.0, 5.0);
/// What the camera looks at.
pub const CAMERA_TARGET: Point3<f32> = Point3::new(0.0, 0.0, 0.0);
/// Vertical field of view in degrees.
pub const FIELD_OF_VIEW_DEGREES: f32 = 75.0;

/// Keeps the camera from flipping over the pole or dipping under the sculpture.
const MAX_PITCH: f32 = FRAC_PI_2 - 0.0001;
const MIN_PITCH: f32 = 0.05;
const MIN_DISTANCE: f32 = 4.0;
const MAX_DISTANCE: f32 = 60.0;

/// A camera orbiting a fixed target.
///
/// Yaw is measured around Y starting from +Z, pitch is the elevation above the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Point3<f32>,
    pub distance: f32,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_at(CAMERA_POSITION, CAMERA_TARGET)
    }
}

impl Camera {
    /// A camera at `eye` looking at `target`.
    pub fn looking_at(eye: Point3<f32>, target: Point3<f32>) -> Self {
        let offset = eye - target;
        let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
        Self {
            target,
            distance: offset.magnitude(),
            yaw: Rad(offset.x.atan2(offset.z)),
            pitch: Rad(offset.y.atan2(horizontal)),
        }
    }

    /// World position of the eye.
    pub fn position(&self) -> Point3<f32> {
        let (yaw_sin, yaw_cos) = self.yaw.0.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.0.sin_cos();
        self.target
            + Vector3::new(pitch_cos * yaw_sin, pitch_sin, pitch_cos * yaw_cos) * self.distance
    }

    /// The view matrix.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }

    /// Applies and clears the controller's accumulated input.
    pub fn apply_controller(&mut self, controller: &mut CameraController) {
        self.yaw -= Rad(controller.rotate_horizontal * controller.sensitivity);
        self.pitch += Rad(controller.rotate_vertical * controller.sensitivity);
        self.pitch = Rad(self.pitch.0.clamp(MIN_PITCH, MAX_PITCH));

        self.distance = (self.distance - controller.scroll * controller.zoom_speed)
            .clamp(MIN_DISTANCE, MAX_DISTANCE);

        controller.rotate_horizontal = 0.0;
        controller.rotate_vertical = 0.0;
        controller.scroll = 0.0;
    }
}

/// Perspective projection settings.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Updates the aspect ratio for a resized viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Perspective matrix already mapped to wgpu clip space.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Accumulates orbit and zoom input until the next update.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
    sensitivity: f32,
    zoom_speed: f32,
}

impl CameraController {
    /// # Arguments
    /// * `sensitivity` - Radians of orbit per pixel of mouse motion
    /// * `zoom_speed` - World units per scroll line
    pub fn new(sensitivity: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
            sensitivity,
            zoom_speed,
        }
    }

    pub fn intake_orbit(&mut self, delta: (f64, f64)) {
        self.rotate_horizontal += delta.0 as f32;
        self.rotate_vertical += delta.1 as f32;
    }

    pub fn intake_zoom(&mut self, lines: f32) {
        self.scroll += lines;
    }

    pub fn has_updates(&self) -> bool {
        self.rotate_horizontal != 0.0 || self.rotate_vertical != 0.0 || self.scroll != 0.0
    }
}

/// Camera data as the shader sees it.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            position: [0.0; 4],
        }
    }
}

impl CameraUniform {
    pub fn update_view_proj_and_pos(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
        let position = camera.position();
        self.position = [position.x, position.y, position.z, 1.0];
    }
}

/// The world ray under a cursor at `screen` pixels in a `viewport` of the given size.
///
/// # Returns
/// `None` if the view-projection matrix cannot be inverted
pub fn screen_ray(
    camera: &Camera,
    projection: &Projection,
    screen: Vector2<f32>,
    viewport: Vector2<f32>,
) -> Option<Ray> {
    let inverse = (projection.calc_matrix() * camera.calc_matrix()).invert()?;
    let ndc = screen_to_ndc(screen, viewport);

    let unproject = |depth: f32| {
        let clip = inverse * Vector4::new(ndc.x, ndc.y, depth, 1.0);
        Point3::from_vec(clip.truncate() / clip.w)
    };

    let near = unproject(0.0);
    let far = unproject(1.0);
    Some(Ray::new(near, far - near))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::scene::picking::DragPlane;

    #[test]
    fn default_camera_sits_at_start_position() {
        let camera = Camera::default();
        let position = camera.position();
        assert!((position - CAMERA_POSITION).magnitude() < 1e-4);
    }

    #[test]
    fn center_ray_hits_target() {
        let camera = Camera::default();
        let projection = Projection::new(800, 600, Deg(FIELD_OF_VIEW_DEGREES), 0.1, 1000.0);
        let viewport = Vector2::new(800.0, 600.0);

        let ray = screen_ray(&camera, &projection, Vector2::new(400.0, 300.0), viewport).unwrap();
        let hit = DragPlane { height: 0.0 }.intersect(&ray).unwrap();
        assert!(hit.magnitude() < 1e-2, "center ray landed at {hit:?}");
    }

    #[test]
    fn screen_right_maps_to_world_right() {
        let camera = Camera::default();
        let projection = Projection::new(800, 600, Deg(FIELD_OF_VIEW_DEGREES), 0.1, 1000.0);
        let viewport = Vector2::new(800.0, 600.0);

        let ray = screen_ray(&camera, &projection, Vector2::new(700.0, 300.0), viewport).unwrap();
        let hit = DragPlane { height: 0.0 }.intersect(&ray).unwrap();
        assert!(hit.x > 1.0);
    }

    #[test]
    fn controller_input_is_clamped_and_consumed() {
        let mut camera = Camera::default();
        let mut controller = CameraController::new(0.01, 1.0);

        controller.intake_orbit((0.0, 10_000.0));
        controller.intake_zoom(1_000.0);
        assert!(controller.has_updates());

        camera.apply_controller(&mut controller);
        assert!(camera.pitch.0 <= MAX_PITCH);
        assert_eq!(camera.distance, MIN_DISTANCE);
        assert!(!controller.has_updates());
    }
}
