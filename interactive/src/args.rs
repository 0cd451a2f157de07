use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
pub struct Args {
    /// Vertex shader source
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/quad.vert"))]
    pub vertex: PathBuf,
    /// Fragment shader source
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/quad.frag"))]
    pub fragment: PathBuf,
    /// Initial window width
    #[arg(long, default_value_t = 800)]
    pub width: u32,
    /// Initial window height
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}
