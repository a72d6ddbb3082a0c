//! Read-only scene inputs consumed by the pipeline
//!
//! Volume loading, environment maps and the camera rig are owned by the host.
//! The pipeline only samples their textures and reads their transforms.

use glam::Mat4;

use crate::core::camera::Camera;
use crate::render::backend::SurfaceId;

/// A 3D scalar field already resident on the GPU
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Volume {
    /// Host-imported 3D texture
    pub texture: SurfaceId,
    /// Placement of the unit volume in world space
    pub model: Mat4,
}

impl Volume {
    pub fn new(texture: SurfaceId) -> Self {
        Self {
            texture,
            model: Mat4::IDENTITY,
        }
    }
}

/// 2D ambient lighting / background map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnvironmentTexture(pub SurfaceId);

/// Everything a stage may read from the scene for one frame
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    pub volume: &'a Volume,
    pub camera: &'a Camera,
    pub environment: &'a EnvironmentTexture,
}

impl<'a> FrameInputs<'a> {
    pub fn new(volume: &'a Volume, camera: &'a Camera, environment: &'a EnvironmentTexture) -> Self {
        Self {
            volume,
            camera,
            environment,
        }
    }

    /// Inverse model-view-projection of the volume as seen by the camera
    pub fn mvp_inverse(&self) -> Mat4 {
        self.camera.volume_mvp_inverse(self.volume.model)
    }
}
