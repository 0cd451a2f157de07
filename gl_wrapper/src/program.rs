use gl::types::{GLenum, GLint, GLuint};
use std::ffi::{c_char, CStr, CString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INFO_LOG_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// The driver operations a [`ShaderProgram`] is built from.
///
/// Every call assumes the right context is current on the calling thread.
pub trait ShaderDriver {
    fn create_shader(&self, stage: ShaderStage) -> GLuint;

    /// Uploads `source` into `shader` and compiles it, returning the driver's info log on
    /// failure.
    fn compile_shader(&self, shader: GLuint, source: &CStr) -> Result<(), String>;

    fn delete_shader(&self, shader: GLuint);

    fn create_program(&self) -> GLuint;

    fn attach_shader(&self, program: GLuint, shader: GLuint);

    /// Links `program`, returning the driver's info log on failure.
    fn link_program(&self, program: GLuint) -> Result<(), String>;

    fn delete_program(&self, program: GLuint);

    fn use_program(&self, program: GLuint);

    /// Raw uniform lookup, `-1` when the name is not an active uniform.
    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint;
}

impl<D: ShaderDriver + ?Sized> ShaderDriver for &D {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        (**self).create_shader(stage)
    }

    fn compile_shader(&self, shader: GLuint, source: &CStr) -> Result<(), String> {
        (**self).compile_shader(shader, source)
    }

    fn delete_shader(&self, shader: GLuint) {
        (**self).delete_shader(shader)
    }

    fn create_program(&self) -> GLuint {
        (**self).create_program()
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        (**self).attach_shader(program, shader)
    }

    fn link_program(&self, program: GLuint) -> Result<(), String> {
        (**self).link_program(program)
    }

    fn delete_program(&self, program: GLuint) {
        (**self).delete_program(program)
    }

    fn use_program(&self, program: GLuint) {
        (**self).use_program(program)
    }

    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint {
        (**self).uniform_location(program, name)
    }
}

/// [`ShaderDriver`] backed by the loaded `gl` function pointers.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlDriver;

impl ShaderDriver for GlDriver {
    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: GLuint, source: &CStr) -> Result<(), String> {
        let mut success: GLint = 0;

        unsafe {
            gl::ShaderSource(shader, 1, &source.as_ptr(), std::ptr::null());
            gl::CompileShader(shader);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);

            if success != gl::TRUE as GLint {
                let mut buf = [0_u8; INFO_LOG_LEN];

                gl::GetShaderInfoLog(
                    shader,
                    INFO_LOG_LEN as i32,
                    std::ptr::null_mut(),
                    buf.as_mut_ptr() as *mut c_char,
                );

                return Err(info_log(&buf));
            }
        }

        Ok(())
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) -> Result<(), String> {
        let mut success: GLint = 0;

        unsafe {
            gl::LinkProgram(program);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);

            if success != gl::TRUE as GLint {
                let mut buf = [0_u8; INFO_LOG_LEN];

                gl::GetProgramInfoLog(
                    program,
                    INFO_LOG_LEN as i32,
                    std::ptr::null_mut(),
                    buf.as_mut_ptr() as *mut c_char,
                );

                return Err(info_log(&buf));
            }
        }

        Ok(())
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn uniform_location(&self, program: GLuint, name: &CStr) -> GLint {
        unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
    }
}

/// Cuts a NUL terminated info log buffer down to its text.
fn info_log(buf: &[u8]) -> String {
    let data = buf.split(|a| *a == 0).next().unwrap_or(buf);

    String::from_utf8_lossy(data).trim_end().to_string()
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not read shader source {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader source {} contains a NUL byte", .path.display())]
    InvalidSource { path: PathBuf },
    #[error("{stage} shader {} failed to compile:\n{log}", .path.display())]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

#[derive(Debug)]
enum State {
    Pending,
    Ready(GLuint),
    Failed(ShaderError),
}

/// A vertex + fragment program compiled from two source files.
///
/// A program is compiled at most once. Any failure is logged and kept, leaving the program
/// unusable; a fresh instance is needed to try again. The linked program is deleted on drop.
pub struct ShaderProgram<D: ShaderDriver = GlDriver> {
    driver: D,
    state: State,
}

impl<D: ShaderDriver> ShaderProgram<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: State::Pending,
        }
    }

    pub fn from_paths(driver: D, vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) -> Self {
        let mut program = Self::new(driver);
        program.compile(vertex, fragment);
        program
    }

    /// Reads, compiles and links the two sources. Does nothing if this program was already
    /// compiled, successfully or not.
    pub fn compile(&mut self, vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) {
        let (vertex, fragment) = (vertex.as_ref(), fragment.as_ref());

        if !matches!(self.state, State::Pending) {
            log::debug!(
                "shader program already compiled, ignoring {:?} and {:?}",
                vertex,
                fragment
            );
            return;
        }

        self.state = match self.build(vertex, fragment) {
            Ok(id) => {
                log::debug!(
                    "linked shader program {} from {:?} and {:?}",
                    id,
                    vertex,
                    fragment
                );
                State::Ready(id)
            }
            Err(e) => {
                log::error!("{e}");
                State::Failed(e)
            }
        };
    }

    fn build(&self, vertex: &Path, fragment: &Path) -> Result<GLuint, ShaderError> {
        // both sources are read before the driver sees anything
        let vert_src = read_source(vertex)?;
        let frag_src = read_source(fragment)?;

        let vert = self.compile_stage(ShaderStage::Vertex, vertex, &vert_src);
        let frag = self.compile_stage(ShaderStage::Fragment, fragment, &frag_src);

        let (vert, frag) = match (vert, frag) {
            (Ok(vert), Ok(frag)) => (vert, frag),
            (Ok(vert), Err(e)) => {
                self.driver.delete_shader(vert);
                return Err(e);
            }
            (Err(e), Ok(frag)) => {
                self.driver.delete_shader(frag);
                return Err(e);
            }
            (Err(e), Err(frag_err)) => {
                log::error!("{frag_err}");
                return Err(e);
            }
        };

        let program = self.driver.create_program();
        self.driver.attach_shader(program, vert);
        self.driver.attach_shader(program, frag);
        let linked = self.driver.link_program(program);

        // the linked program keeps what it needs from the stages
        self.driver.delete_shader(vert);
        self.driver.delete_shader(frag);

        match linked {
            Ok(()) => Ok(program),
            Err(log) => {
                self.driver.delete_program(program);
                Err(ShaderError::Link { log })
            }
        }
    }

    /// Compiles one stage. A shader object that fails to compile is released here.
    fn compile_stage(
        &self,
        stage: ShaderStage,
        path: &Path,
        source: &CStr,
    ) -> Result<GLuint, ShaderError> {
        let shader = self.driver.create_shader(stage);

        match self.driver.compile_shader(shader, source) {
            Ok(()) => Ok(shader),
            Err(log) => {
                self.driver.delete_shader(shader);
                Err(ShaderError::Compile {
                    stage,
                    path: path.to_owned(),
                    log,
                })
            }
        }
    }

    /// Makes this the program used by subsequent draw calls.
    ///
    /// A program that is not compiled binds program `0`, which draws nothing.
    pub fn activate(&self) {
        if !self.is_compiled() {
            log::warn!("activating a shader program that is not compiled");
        }

        self.driver.use_program(self.handle());
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// The raw program id, `0` unless compiled.
    pub fn handle(&self) -> GLuint {
        match self.state {
            State::Ready(id) => id,
            _ => 0,
        }
    }

    /// The failure of the compile attempt, if it failed.
    pub fn error(&self) -> Option<&ShaderError> {
        match &self.state {
            State::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn uniform_location(&self, name: &str) -> Option<GLint> {
        let State::Ready(id) = self.state else {
            return None;
        };

        let name = CString::new(name).ok()?;

        match self.driver.uniform_location(id, &name) {
            -1 => None,
            location => Some(location),
        }
    }
}

impl<D: ShaderDriver> Drop for ShaderProgram<D> {
    fn drop(&mut self) {
        if let State::Ready(id) = self.state {
            self.driver.delete_program(id);
        }
    }
}

fn read_source(path: &Path) -> Result<CString, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::FileRead {
        path: path.to_owned(),
        source,
    })?;

    CString::new(source).map_err(|_| ShaderError::InvalidSource {
        path: path.to_owned(),
    })
}
