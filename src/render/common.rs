use glam::{Mat4, Vec3};

use crate::camera::PerspectiveCamera;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

impl From<&PerspectiveCamera> for CameraParams {
    fn from(camera: &PerspectiveCamera) -> Self {
        Self {
            view_proj: camera.view_proj(),
            position: camera.position,
        }
    }
}

/// Lighting state consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct LightParams {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for LightParams {
    /// Warm key light above and in front of the card.
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 3.0, 6.0),
            color: Vec3::new(1.0, 0.96, 0.92),
            intensity: 1.0,
        }
    }
}
