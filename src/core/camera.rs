//! Camera supplying the view and projection transforms to the pipeline

use crate::core::types::{Mat4, Vec3};

/// Perspective camera aimed at a point
///
/// The rig that animates the camera lives with the host; the pipeline only
/// reads the matrices exposed here.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Width over height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Square-aspect camera at `eye` looking at `target`
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            eye,
            target,
            up,
            fov_y: 45.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.01,
            far: 100.0,
        }
    }

    /// Camera on a sphere of `distance` around the origin
    ///
    /// `yaw` turns about +Y, `pitch` lifts towards +Y; both in radians.
    pub fn orbit(yaw: f32, pitch: f32, distance: f32) -> Self {
        let eye = Vec3::new(
            distance * pitch.cos() * yaw.sin(),
            distance * pitch.sin(),
            distance * pitch.cos() * yaw.cos(),
        );
        Self::look_at(eye, Vec3::ZERO, Vec3::Y)
    }

    pub fn with_fov_degrees(mut self, degrees: f32) -> Self {
        self.fov_y = degrees.to_radians();
        self
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Right-handed projection with depth in `[0, 1]`
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Inverse model-view-projection for ray generation through a unit volume
    ///
    /// The volume occupies `[0, 1]^3` in its own space and is recentred on the
    /// origin before `model` is applied.
    pub fn volume_mvp_inverse(&self, model: Mat4) -> Mat4 {
        let center = Mat4::from_translation(Vec3::splat(-0.5));
        (self.view_projection() * model * center).inverse()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_down_negative_z() {
        let forward = Camera::default().forward();
        assert!((forward.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let camera = Camera::orbit(0.7, 0.3, 2.5);
        assert!((camera.eye.length() - 2.5).abs() < 1e-4);
        assert!(camera.forward().dot(-camera.eye.normalize()) > 0.9999);
    }

    #[test]
    fn test_volume_mvp_inverse_roundtrip() {
        let camera = Camera::orbit(0.4, 0.2, 2.0);
        let inv = camera.volume_mvp_inverse(Mat4::IDENTITY);
        let forward = camera.view_projection() * Mat4::from_translation(Vec3::splat(-0.5));
        assert!((forward * inv).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn test_volume_center_maps_to_screen_center() {
        let camera = Camera::default();
        let mvp = camera.view_projection() * Mat4::from_translation(Vec3::splat(-0.5));
        let clip = mvp.project_point3(Vec3::splat(0.5));
        assert!(clip.x.abs() < 1e-4);
        assert!(clip.y.abs() < 1e-4);
    }

    #[test]
    fn test_rays_unproject_into_the_volume() {
        // the screen-centre ray enters the unit cube at its front face
        let camera = Camera::default();
        let inv = camera.volume_mvp_inverse(Mat4::IDENTITY);
        let near = inv.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let far = inv.project_point3(Vec3::new(0.0, 0.0, 1.0));
        assert!((near.x - 0.5).abs() < 1e-3 && (near.y - 0.5).abs() < 1e-3);
        assert!(far.z < near.z);
    }
}
