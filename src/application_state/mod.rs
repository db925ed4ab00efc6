//! # Application State Management
//!
//! This module handles the application's state management, including:
//! - Window and graphics initialization
//! - Input handling
//! - The image store and the bundled examples
//! - State transitions between initialization and running states

pub mod error;
pub mod examples;
pub mod graphics_resources_builder;
pub mod image_store;
pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use graphics_resources_builder::{AppEvent, GraphicsBuilder, MaybeGraphics, WINDOW_TITLE};
use image_store::ImageStore;
use input_manager::InputManager;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine_state::EngineState;

/// Owns graphics bring-up, the running engine and the image store.
pub struct ApplicationState {
    /// The current graphics state, which may be building, ready, or handed to the engine
    pub graphics: MaybeGraphics,

    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,

    /// Cached window size for web platforms during initialization
    pub web_window_size: Option<PhysicalSize<u32>>,

    /// The image on screen
    pub image_store: ImageStore,

    #[cfg(target_family = "wasm")]
    event_loop_proxy: EventLoopProxy<AppEvent>,

    #[cfg(target_family = "wasm")]
    example_in_flight: bool,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    pub engine_state: EngineState,
    pub window: Arc<Window>,
    pub input_manager: InputManager,
    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

impl ApplicationState {
    pub fn new(event_loop_proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            graphics: MaybeGraphics::Builder(GraphicsBuilder::new(event_loop_proxy.clone())),
            state: None,
            web_window_size: None,
            image_store: ImageStore::default(),
            #[cfg(target_family = "wasm")]
            event_loop_proxy,
            #[cfg(target_family = "wasm")]
            example_in_flight: false,
        }
    }

    /// Handles window resize events during the initialization phase.
    fn resized(&mut self, size: PhysicalSize<u32>) {
        let MaybeGraphics::Graphics(gfx) = &mut self.graphics else {
            return;
        };
        if size.width == 0 || size.height == 0 {
            return;
        }

        gfx.surface_config.width = size.width;
        gfx.surface_config.height = size.height;
        gfx.surface.configure(&gfx.device, &gfx.surface_config);
        gfx.is_surface_configured = true;

        self.initialize_application_state();
    }

    /// Hands the graphics resources to a new engine and loads the first example.
    fn initialize_application_state(&mut self) {
        let gfx = match std::mem::replace(&mut self.graphics, MaybeGraphics::Moved) {
            MaybeGraphics::Graphics(gfx) => gfx,
            other => {
                self.graphics = other;
                return;
            }
        };

        let engine_state =
            match EngineState::new(gfx.surface, gfx.surface_config, gfx.device, gfx.queue) {
                Ok(engine_state) => engine_state,
                Err(error) => {
                    log::error!("Failed to start engine: {error}");
                    return;
                }
            };

        self.state = Some(InitializedApplicationState {
            engine_state,
            window: gfx.window,
            input_manager: InputManager::new(),
            last_wait_time: web_time::Instant::now(),
        });

        self.load_next_example();
    }

    #[cfg(not(target_family = "wasm"))]
    fn load_next_example(&mut self) {
        if let Err(error) = self.image_store.load_next_example(examples::fetch_example) {
            log::error!("Failed to load example: {error}");
        }
    }

    /// Serves the next example from the cache, or starts fetching it.
    #[cfg(target_family = "wasm")]
    fn load_next_example(&mut self) {
        if self.example_in_flight {
            return;
        }

        let request = match self.image_store.next_example() {
            Ok(request) => request,
            Err(error) => {
                log::error!("Failed to load example: {error}");
                return;
            }
        };

        if let Some(bytes) = self.image_store.cached_example(&request) {
            if let Err(error) = self.image_store.load_example(&request, bytes) {
                log::error!("Failed to load example: {error}");
            }
            return;
        }

        self.example_in_flight = true;
        let proxy = self.event_loop_proxy.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = examples::fetch_example(&request).await;
            if proxy
                .send_event(AppEvent::ExampleFetched { request, result })
                .is_err()
            {
                log::error!("Event loop closed before the example arrived");
            }
        });
    }

    /// Runs one frame of simulation after input has been applied to the store.
    fn advance_frame(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = web_time::Instant::now();
        let wait_dt = now - state.last_wait_time;
        state.last_wait_time = now;

        if state.engine_state.sync_scene(&self.image_store) {
            let title = self
                .image_store
                .caption()
                .unwrap_or_else(|| WINDOW_TITLE.to_string());
            state.window.set_title(&title);
        }

        state.engine_state.process_input();
        state.engine_state.update(wait_dt);
        state.window.request_redraw();
    }
}

#[cfg(not(target_family = "wasm"))]
fn load_dropped_file(store: &mut ImageStore, path: &std::path::Path) {
    let result = image_store::ImageFile::read(path).and_then(|file| store.load_from_file(Some(file)));

    if let Err(error) = result {
        log::error!("Failed to load dropped file: {error}");
    }
}

impl ApplicationHandler<AppEvent> for ApplicationState {
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(state) = &mut self.state {
            let input_manager = &mut state.input_manager;
            let engine_state = &mut state.engine_state;

            input_manager.intake_input(&event);

            match event {
                WindowEvent::Resized(size) => {
                    engine_state.resize_surface(size);
                }
                WindowEvent::Focused(is_focused) => {
                    if !is_focused {
                        input_manager.release_all();
                    }
                }
                WindowEvent::RedrawRequested => {
                    engine_state.render();
                }
                #[cfg(not(target_family = "wasm"))]
                WindowEvent::DroppedFile(path) => {
                    load_dropped_file(&mut self.image_store, &path);
                }
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                } => event_loop.exit(),
                _ => (),
            }
        } else {
            match event {
                WindowEvent::Resized(size) => {
                    self.web_window_size = Some(size);
                    self.resized(size);
                }
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                } => event_loop.exit(),
                _ => (),
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let MaybeGraphics::Builder(builder) = &mut self.graphics {
            builder.build_and_send(event_loop);
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::GraphicsReady(graphics) => {
                let is_surface_configured = graphics.is_surface_configured;

                self.graphics = MaybeGraphics::Graphics(graphics);

                if is_surface_configured {
                    self.initialize_application_state();
                } else if let Some(size) = self.web_window_size {
                    self.resized(size);
                }
            }
            AppEvent::ExampleFetched { request, result } => {
                #[cfg(target_family = "wasm")]
                {
                    self.example_in_flight = false;
                }

                let loaded =
                    result.and_then(|bytes| self.image_store.load_example(&request, bytes));
                if let Err(error) = loaded {
                    log::error!("Failed to load example '{}': {error}", request.name);
                }
            }
        }
    }

    /// Applies store actions from this frame's input, then advances the engine.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let processed_input = state.input_manager.get_and_reset_processed_input();
        state.engine_state.set_input_commands(processed_input);

        let actions = &state.engine_state.viewer_actions;
        let (clear_image, load_next_example) = (actions.clear_image, actions.load_next_example);

        if clear_image {
            self.image_store.clear();
        }
        if load_next_example {
            self.load_next_example();
        }

        self.advance_frame();
    }
}
