//! # Engine State Module
//!
//! Coordinates the GPU device, the camera, the renderer and the voxel scene.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container
//! * `buffer_state` - Named GPU buffers
//! * `camera_state` - Orbit camera and cursor rays
//! * `physics` - The rapier world behind the blocks
//! * `scene` - Per-block records, dragging and the entrance animation
//! * `rendering` - The instanced cube pipeline
//! * `voxels` - Turning a processed image into block descriptors
//!
//! ## Frame
//!
//! Each frame runs `set_input_commands`, `process_input`, `update` and `render` in that
//! order. The scene is rebuilt from the image store whenever the store's revision changes.

use cgmath::Vector2;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{event::MouseButton, keyboard::KeyCode};

use buffer_state::BufferState;
use camera_state::CameraState;
use error::RenderError;
use rendering::VoxelRenderer;
use scene::{drag::DragOutcome, scratch::ScratchArena, VoxelScene};
use voxels::layout::{build_layout, BLOCK_SIZE};

use crate::application_state::{image_store::ImageStore, input_state::ProcessedInputState};

pub mod buffer_state;
pub mod camera_state;
pub mod error;
pub mod physics;
pub mod rendering;
pub mod scene;
pub mod voxels;

pub struct EngineState {
    pub device: Device,
    pub queue: Queue,
    pub buffer_state: BufferState,
    pub camera_state: CameraState,
    pub renderer: VoxelRenderer,
    pub scene: VoxelScene,
    /// Actions derived from this frame's input
    pub viewer_actions: ViewerAction,
    scratch: ScratchArena,
    /// Image store revision the scene was last built from
    last_revision: u64,
}

impl EngineState {
    /// Creates the engine with an empty scene.
    ///
    /// # Errors
    /// Fails if the cube buffers cannot be bound to the pipeline.
    pub fn new(
        surface: Surface<'static>,
        surface_config: SurfaceConfiguration,
        device: Device,
        queue: Queue,
    ) -> Result<Self, RenderError> {
        let mut buffer_state = BufferState::new();

        let camera_state = CameraState::new(
            &device,
            &mut buffer_state,
            surface_config.width,
            surface_config.height,
        );
        let renderer = VoxelRenderer::new(surface, surface_config, &device, &mut buffer_state)?;

        Ok(Self {
            device,
            queue,
            buffer_state,
            camera_state,
            renderer,
            scene: VoxelScene::default(),
            viewer_actions: ViewerAction::default(),
            scratch: ScratchArena::new(),
            last_revision: 0,
        })
    }

    /// Resizes the rendering surface and the camera projection.
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.renderer.resize_surface(&self.device, size);
        self.camera_state.resize(size.width, size.height);
    }

    /// Rebuilds the scene if the store changed since the last call.
    ///
    /// # Returns
    /// `true` if the scene was rebuilt
    pub fn sync_scene(&mut self, store: &ImageStore) -> bool {
        if store.revision() == self.last_revision {
            return false;
        }
        self.last_revision = store.revision();

        self.scene = match store.current() {
            Some(image) => VoxelScene::new(&build_layout(&image.processed, BLOCK_SIZE)),
            None => VoxelScene::default(),
        };

        log::info!(
            "Rebuilt scene with {} blocks (revision {})",
            self.scene.len(),
            self.last_revision
        );
        true
    }

    /// Translates a frame of input into viewer actions.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.viewer_actions = translate_processed_input(&input);

        if self.viewer_actions.log_buffer_data {
            log::info!(
                "Total allocated memory: {}",
                self.buffer_state.get_total_allocated_memory()
            );
            log::info!(
                "Total used memory: {}",
                self.buffer_state.get_total_used_memory()
            );
        }
    }

    /// Feeds this frame's viewer actions to the camera controller and the scene.
    pub fn process_input(&mut self) {
        let actions = &self.viewer_actions;

        if let Some(delta) = actions.orbit {
            self.camera_state.camera_controller.intake_orbit(delta);
        }
        if actions.zoom != 0.0 {
            self.camera_state.camera_controller.intake_zoom(actions.zoom);
        }

        if let Some(cursor) = actions.pointer_pressed {
            self.scene.pointer_down(cursor);
        }

        if let Some(cursor) = actions.pointer_moved {
            match self.camera_state.ray_through(cursor) {
                Some(ray) => match self.scene.pointer_move(cursor, &ray) {
                    DragOutcome::Started { instance, .. } => {
                        log::debug!("Picked block {instance}");
                    }
                    DragOutcome::Ignored | DragOutcome::Moved { .. } | DragOutcome::Released { .. } => {}
                },
                None => log::debug!("No camera ray through {:?}", cursor),
            }
        }

        if actions.pointer_released {
            if let DragOutcome::Released { instance } = self.scene.pointer_up() {
                log::debug!("Released block {instance}");
            }
        }
    }

    /// Advances the scene and re-uploads the camera if it moved.
    pub fn update(&mut self, dt: web_time::Duration) {
        self.scene.tick(dt.as_secs_f32());

        if let Err(error) = self.camera_state.update(&self.queue, &mut self.buffer_state) {
            log::error!("Camera update failed: {error}");
        }
    }

    /// Renders the current frame.
    pub fn render(&mut self) {
        let scratch = self.scratch.begin_frame();
        self.scene.write_instances(&mut scratch.instances);
        let instance_count = scratch.instances.len() as u32;

        if let Err(error) = self.renderer.render(
            &self.device,
            &self.queue,
            &mut self.buffer_state,
            self.scratch.instance_bytes(),
            instance_count,
        ) {
            log::error!("Render failed: {error}");
        }
    }
}

/// Viewer actions derived from one frame of input.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ViewerAction {
    /// Left button went down at this cursor position
    pub pointer_pressed: Option<Vector2<f32>>,
    /// Cursor moved to this position with the left button down
    pub pointer_moved: Option<Vector2<f32>>,
    /// Left button came up
    pub pointer_released: bool,
    /// Right-drag motion
    pub orbit: Option<(f64, f64)>,
    /// Scroll lines, positive towards the target
    pub zoom: f32,
    pub load_next_example: bool,
    pub clear_image: bool,
    pub log_buffer_data: bool,
}

/// Translates the processed input state into viewer actions.
pub fn translate_processed_input(input: &ProcessedInputState) -> ViewerAction {
    let mut actions = ViewerAction::default();

    let cursor = input
        .cursor_position
        .map(|(x, y)| Vector2::new(x as f32, y as f32));
    let left = input.get_mouse_button_state(MouseButton::Left);

    if left.is_just_pressed() {
        actions.pointer_pressed = cursor;
    }
    if input.cursor_moved && left.is_active() {
        actions.pointer_moved = cursor;
    }
    actions.pointer_released = left.is_just_released();

    if input.get_mouse_button_state(MouseButton::Right).is_active() {
        actions.orbit = input.get_mouse_delta();
    }
    actions.zoom = input.scroll_lines;

    actions.load_next_example = input.get_key_state(KeyCode::KeyN).is_just_pressed();
    actions.clear_image = input.get_key_state(KeyCode::Backspace).is_just_pressed();
    actions.log_buffer_data = input.get_mouse_button_state(MouseButton::Middle).is_just_pressed();

    actions
}
