use glam::{Mat4, Vec3};

/// Perspective camera looking down -Z from its position.
///
/// The projection matrix is cached; callers that change `fov_degrees`,
/// `aspect`, `near` or `far` must call [`update_projection_matrix`] before
/// the next render.
///
/// [`update_projection_matrix`]: PerspectiveCamera::update_projection_matrix
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(75.0, 1.0, 0.1, 10_000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            fov_degrees,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the cached projection from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = PerspectiveCamera::default();
        assert_eq!(cam.fov_degrees, 75.0);
        let vp = cam.view_projection();
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn projection_is_cached_until_updated() {
        let mut cam = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 10_000.0);
        let before = cam.projection_matrix();

        cam.aspect = 1920.0 / 1080.0;
        assert_eq!(cam.projection_matrix(), before);

        cam.update_projection_matrix();
        assert_ne!(cam.projection_matrix(), before);
    }

    #[test]
    fn points_in_front_project_inside_clip_volume() {
        let cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 10_000.0);
        let clip = cam.view_projection() * Vec3::new(0.0, 0.0, -100.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
