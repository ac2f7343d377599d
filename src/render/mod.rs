mod common;
mod gpu;
mod shader;

pub use common::{CameraParams, LightParams};
pub use gpu::Renderer;
