use glam::{Mat4, Vec3};

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
        }
    }
}

impl PerspectiveCamera {
    /// Projection times view, with depth mapped to `0..1` as wgpu expects.
    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        );
        projection * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let camera = PerspectiveCamera::default();
        let clip = camera.view_proj().project_point3(camera.target);
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn wider_aspect_squeezes_x() {
        let point = Vec3::new(1.0, 0.0, 0.0);
        let square = PerspectiveCamera::default();
        let wide = PerspectiveCamera {
            aspect: 2.0,
            ..square
        };
        let narrow_x = square.view_proj().project_point3(point).x;
        let wide_x = wide.view_proj().project_point3(point).x;
        assert!((narrow_x - wide_x * 2.0).abs() < 1e-5);
    }
}
