use std::ffi::c_void;

use crate::geometry::Geometry;
use crate::program::{ShaderDriver, ShaderProgram};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
}

impl PolygonMode {
    pub fn toggled(self) -> Self {
        match self {
            PolygonMode::Fill => PolygonMode::Line,
            PolygonMode::Line => PolygonMode::Fill,
        }
    }

    fn gl_enum(self) -> u32 {
        match self {
            PolygonMode::Fill => gl::FILL,
            PolygonMode::Line => gl::LINE,
        }
    }
}

pub struct GlRenderer {
    current_program: u32,
}

impl GlRenderer {
    pub fn new() -> Self {
        Self { current_program: 0 }
    }

    /// Draws `geometry` with `program`, activating it only when it is not bound yet.
    pub fn draw<D: ShaderDriver>(&mut self, geometry: &Geometry, program: &ShaderProgram<D>) {
        let p_id = program.handle();
        if self.current_program != p_id || p_id == 0 {
            program.activate();
            self.current_program = p_id;
        }

        unsafe {
            gl::BindVertexArray(geometry.vao());
            if geometry.is_indexed() {
                gl::DrawElements(
                    gl::TRIANGLES,
                    geometry.count() as i32,
                    gl::UNSIGNED_INT,
                    std::ptr::null::<c_void>(),
                );
            } else {
                gl::DrawArrays(gl::TRIANGLES, 0, geometry.count() as i32);
            }
            gl::BindVertexArray(0);
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
        }
    }

    pub fn clear_color(&self, r: f32, g: f32, b: f32) {
        unsafe {
            gl::ClearColor(r, g, b, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    pub fn polygon_mode(&self, mode: PolygonMode) {
        unsafe {
            gl::PolygonMode(gl::FRONT_AND_BACK, mode.gl_enum());
        }
    }
}

impl Default for GlRenderer {
    fn default() -> Self {
        Self::new()
    }
}
