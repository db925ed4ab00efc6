#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxelish
//!
//! Turns a small image into a sculpture of draggable, physics-driven blocks rendered with
//! wgpu.
//!
//! ## Key Modules
//!
//! * `image_pipeline` - Decoding and processing an image into a small RGBA grid
//! * `engine_state` - Layout, physics, the interactive scene and rendering
//! * `application_state` - Window lifecycle, input and the image store
//!
//! ## Usage
//!
//! ```no_run
//! // Native application initialization
//! fn main() {
//!     voxelish::run();
//! }
//! ```
//!
//! On the web, `run_web` is exported to JavaScript and draws into the canvas with id
//! `wgpu-canvas`.

use application_state::ApplicationState;
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::wasm_bindgen;

use winit::event_loop::EventLoop;

pub mod application_state;
pub mod engine_state;
pub mod image_pipeline;

#[cfg(target_family = "wasm")]
const CANVAS_ID: &str = "wgpu-canvas";

#[cfg(not(target_family = "wasm"))]
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    log::info!("Logger initialized");
    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("Failed to create event loop");

    let mut state = ApplicationState::new(event_loop.create_proxy());

    if let Err(error) = event_loop.run_app(&mut state) {
        log::error!("Event loop exited with error: {error}");
    }
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info).expect("Couldn't initialize logger");

    let event_loop = EventLoop::with_user_event()
        .build()
        .expect("Failed to create event loop");

    let state = ApplicationState::new(event_loop.create_proxy());

    event_loop.spawn_app(state);
}
