//! # Graphics Resources Builder
//!
//! Creates the window, surface, device and queue. Native builds block on the adapter and
//! device requests. Web builds spawn them and post the result back to the event loop as an
//! [`AppEvent::GraphicsReady`] user event.

use std::future::Future;
use std::sync::Arc;

#[cfg(target_family = "wasm")]
use wasm_bindgen::UnwrapThrowExt;

use wgpu::{Device, Queue, Surface, SurfaceConfiguration};
use winit::{
    event_loop::{ActiveEventLoop, EventLoopProxy},
    window::Window,
};

#[cfg(target_family = "wasm")]
use crate::CANVAS_ID;

use super::{error::LoadError, examples::ExampleRequest};

/// Title used until an image is loaded.
pub const WINDOW_TITLE: &str = "voxelish";

/// Events posted to the event loop from async work.
pub enum AppEvent {
    /// Graphics bring-up finished
    GraphicsReady(Graphics),
    /// An example image arrived, or failed to
    ExampleFetched {
        request: ExampleRequest,
        result: Result<Vec<u8>, LoadError>,
    },
}

/// Everything the engine needs from the GPU and the window.
pub struct Graphics {
    pub window: Arc<Window>,
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
    pub device: Device,
    pub queue: Queue,
    /// Web canvases report their size only after the first resize event
    pub is_surface_configured: bool,
}

fn create_graphics(event_loop: &ActiveEventLoop) -> impl Future<Output = Graphics> + 'static {
    #[allow(unused_mut)]
    let mut window_attrs = Window::default_attributes().with_title(WINDOW_TITLE);

    #[cfg(target_family = "wasm")]
    {
        use web_sys::wasm_bindgen::JsCast;
        use winit::platform::web::WindowAttributesExtWebSys;

        let window = web_sys::window().unwrap_throw();
        let document = window.document().unwrap_throw();
        let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
        let html_canvas_element = canvas.unchecked_into();
        window_attrs = window_attrs.with_canvas(Some(html_canvas_element));
    }

    let window = Arc::new(
        event_loop
            .create_window(window_attrs)
            .expect("Failed to create window"),
    );

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_family = "wasm"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_family = "wasm")]
        backends: wgpu::Backends::GL | wgpu::Backends::BROWSER_WEBGPU,
        flags: wgpu::InstanceFlags::empty(),
        backend_options: wgpu::BackendOptions::from_env_or_default(),
    });

    let surface = instance
        .create_surface(window.clone())
        .expect("Failed to create surface");

    async move {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("No compatible graphics adapter");

        let required_limits = if cfg!(target_family = "wasm") {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::default()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits,
                label: None,
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request device");

        let size = window.inner_size();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let is_surface_configured = cfg!(not(target_family = "wasm"));
        if is_surface_configured {
            surface.configure(&device, &surface_config);
        }

        log::info!(
            "Graphics ready on {:?} with {:?}",
            adapter.get_info().backend,
            surface_format
        );

        Graphics {
            window,
            surface,
            surface_config,
            device,
            queue,
            is_surface_configured,
        }
    }
}

/// Builds graphics once and sends them back through the event loop proxy.
pub struct GraphicsBuilder {
    event_loop_proxy: Option<EventLoopProxy<AppEvent>>,
}

/// The stages of graphics bring-up.
pub enum MaybeGraphics {
    Builder(GraphicsBuilder),
    Graphics(Graphics),
    /// Handed over to the engine
    Moved,
}

impl GraphicsBuilder {
    pub fn new(event_loop_proxy: EventLoopProxy<AppEvent>) -> Self {
        Self {
            event_loop_proxy: Some(event_loop_proxy),
        }
    }

    /// Starts graphics creation. Later calls do nothing.
    pub fn build_and_send(&mut self, event_loop: &ActiveEventLoop) {
        let Some(event_loop_proxy) = self.event_loop_proxy.take() else {
            return;
        };

        #[cfg(target_family = "wasm")]
        {
            let gfx_fut = create_graphics(event_loop);
            wasm_bindgen_futures::spawn_local(async move {
                let gfx = gfx_fut.await;
                if event_loop_proxy.send_event(AppEvent::GraphicsReady(gfx)).is_err() {
                    log::error!("Event loop closed before graphics were ready");
                }
            });
        }

        #[cfg(not(target_family = "wasm"))]
        {
            let gfx = pollster::block_on(create_graphics(event_loop));
            if event_loop_proxy.send_event(AppEvent::GraphicsReady(gfx)).is_err() {
                log::error!("Event loop closed before graphics were ready");
            }
        }
    }
}
