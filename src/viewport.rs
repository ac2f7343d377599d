use crate::camera::PerspectiveCamera;

/// Something with a backing buffer that can be resized, such as a swap chain.
pub trait RenderSurface {
    fn backing_size(&self) -> (u32, u32);
    fn set_backing_size(&mut self, width: u32, height: u32);
}

/// Brings the surface's backing buffer in line with the displayed (client)
/// size and updates the camera aspect to match.
///
/// Issues exactly one resize when the sizes differ and nothing when they
/// already agree. Returns whether a resize happened. A zero-area client is
/// left alone since there is nothing to draw into.
pub fn reconcile<S>(surface: &mut S, client: (u32, u32), camera: &mut PerspectiveCamera) -> bool
where
    S: RenderSurface + ?Sized,
{
    let (width, height) = client;
    if width == 0 || height == 0 || surface.backing_size() == client {
        return false;
    }
    surface.set_backing_size(width, height);
    camera.aspect = width as f32 / height as f32;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        size: (u32, u32),
        resizes: Vec<(u32, u32)>,
    }

    impl RenderSurface for FakeSurface {
        fn backing_size(&self) -> (u32, u32) {
            self.size
        }

        fn set_backing_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.resizes.push((width, height));
        }
    }

    #[test]
    fn matching_sizes_issue_no_resize() {
        let mut surface = FakeSurface {
            size: (800, 600),
            ..FakeSurface::default()
        };
        let mut camera = PerspectiveCamera::default();
        let before = camera;
        assert!(!reconcile(&mut surface, (800, 600), &mut camera));
        assert!(surface.resizes.is_empty());
        assert_eq!(camera, before);
    }

    #[test]
    fn mismatch_issues_exactly_one_resize() {
        let mut surface = FakeSurface {
            size: (300, 150),
            ..FakeSurface::default()
        };
        let mut camera = PerspectiveCamera::default();
        assert!(reconcile(&mut surface, (1280, 720), &mut camera));
        assert_eq!(surface.resizes, vec![(1280, 720)]);
        assert_eq!(camera.aspect, 1280.0 / 720.0);

        assert!(!reconcile(&mut surface, (1280, 720), &mut camera));
        assert_eq!(surface.resizes.len(), 1);
    }

    #[test]
    fn zero_area_client_is_ignored() {
        let mut surface = FakeSurface {
            size: (300, 150),
            ..FakeSurface::default()
        };
        let mut camera = PerspectiveCamera::default();
        assert!(!reconcile(&mut surface, (0, 720), &mut camera));
        assert!(surface.resizes.is_empty());
    }
}
