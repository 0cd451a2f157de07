use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{ElementState, Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use gl_wrapper::geometry::{GBError, Geometry, GeometryBuilder, VertexAttribute};
use gl_wrapper::program::{GlDriver, ShaderProgram};
use gl_wrapper::renderer::{GlRenderer, PolygonMode};
use gl_wrapper::{QUAD, QUAD_INDICES};

use crate::args::Args;

const CLEAR_COLOR: (f32, f32, f32) = (0.1, 0.2, 0.3);

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    program: ShaderProgram<GlDriver>,
    quad: Geometry,
    gl_renderer: GlRenderer,
}

impl App {
    pub fn new(args: &Args) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(args.width, args.height)))
            .with_title("Hello Window");
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |mut configs| {
                configs
                    .next()
                    .expect("glutin offers at least one config to the picker")
            })
            .map_err(|e| AppError::Display(e.to_string()))?;

        let window = window.ok_or(AppError::NoWindow)?;
        let handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(handle));

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        gl::load_with(|s| match CString::new(s) {
            Ok(s) => gl_display.get_proc_address(s.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        });

        let program = ShaderProgram::from_paths(GlDriver, &args.vertex, &args.fragment);
        if let Some(e) = program.error() {
            return Err(AppError::Shader(e.to_string()));
        }

        let quad = GeometryBuilder::new(&QUAD)
            .with_attribute(VertexAttribute::Vec3)
            .with_indices(&QUAD_INDICES)
            .build()?;

        let gl_renderer = GlRenderer::new();
        gl_renderer.resize(args.width, args.height);

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            program,
            quad,
            gl_renderer,
        })
    }

    pub fn run(self) -> ! {
        let Self {
            event_loop,
            gl_context,
            gl_window,
            program,
            quad,
            mut gl_renderer,
        } = self;

        let mut wireframe = WireframeToggle::default();

        event_loop.run(move |event, _window_target, control_flow| {
            *control_flow = ControlFlow::Poll;
            match event {
                Event::MainEventsCleared => {
                    gl_window.window.request_redraw();
                }
                Event::RedrawRequested(_) => {
                    let (r, g, b) = CLEAR_COLOR;
                    gl_renderer.clear_color(r, g, b);
                    gl_renderer.draw(&quad, &program);

                    if let Err(e) = gl_window.surface.swap_buffers(&gl_context) {
                        log::error!("Could not swap buffers: {e}");
                        control_flow.set_exit();
                    }
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::Resized(size) => {
                        if let (Some(width), Some(height)) =
                            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                        {
                            gl_window.surface.resize(&gl_context, width, height);
                            gl_renderer.resize(size.width, size.height);
                            gl_window.window.request_redraw();
                        }
                    }
                    WindowEvent::KeyboardInput { input, .. } => match input.virtual_keycode {
                        Some(VirtualKeyCode::Escape) => control_flow.set_exit(),
                        Some(VirtualKeyCode::W) => {
                            if let Some(mode) =
                                wireframe.key(input.state == ElementState::Pressed)
                            {
                                log::debug!("Polygon mode {:?}", mode);
                                gl_renderer.polygon_mode(mode);
                            }
                        }
                        _ => {}
                    },
                    WindowEvent::CloseRequested => control_flow.set_exit(),
                    _ => (),
                },
                Event::LoopDestroyed => log::info!("A bye bye!"),
                _ => (),
            }
        })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).ok_or(AppError::ZeroSize)?,
            NonZeroU32::new(height).ok_or(AppError::ZeroSize)?,
        );

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self { window, surface })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Could not create display: {0}")]
    Display(String),
    #[error("Display was built without a window")]
    NoWindow,
    #[error("Window has a zero size")]
    ZeroSize,
    #[error(transparent)]
    Context(#[from] glutin::error::Error),
    #[error("Shader program is unusable: {0}")]
    Shader(String),
    #[error(transparent)]
    Geometry(#[from] GBError),
}

/// Flips between filled and wireframe polygons on each press of a key, ignoring held repeats.
#[derive(Debug)]
pub struct WireframeToggle {
    held: bool,
    mode: PolygonMode,
}

impl Default for WireframeToggle {
    fn default() -> Self {
        Self {
            held: false,
            mode: PolygonMode::Fill,
        }
    }
}

impl WireframeToggle {
    /// Returns the new mode when `pressed` is a fresh press.
    pub fn key(&mut self, pressed: bool) -> Option<PolygonMode> {
        let fresh = pressed && !self.held;
        self.held = pressed;

        if fresh {
            self.mode = self.mode.toggled();
            Some(self.mode)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_toggles_once() {
        let mut toggle = WireframeToggle::default();

        assert_eq!(toggle.key(true), Some(PolygonMode::Line));
        assert_eq!(toggle.key(true), None);
        assert_eq!(toggle.key(true), None);
        assert_eq!(toggle.key(false), None);
        assert_eq!(toggle.key(true), Some(PolygonMode::Fill));
    }

    #[test]
    fn release_without_press_does_nothing() {
        let mut toggle = WireframeToggle::default();

        assert_eq!(toggle.key(false), None);
        assert_eq!(toggle.mode, PolygonMode::Fill);
    }
}
