//! A set of same-sized surfaces bound together as one draw destination

use crate::core::types::Result;
use crate::render::backend::{FramebufferId, GpuBackend, SurfaceId, Viewport};
use crate::render::bindings::CurrentBindings;
use crate::render::target::attachment::{validate_specs, AttachmentSpec};

/// Owns N surfaces and the framebuffer that binds them as outputs 0..N
///
/// Created once, destroyed once with [`FrameTarget::destroy`], which consumes
/// the target so a second release cannot compile.
#[derive(Debug)]
pub struct FrameTarget {
    label: String,
    specs: Vec<AttachmentSpec>,
    attachments: Vec<SurfaceId>,
    framebuffer: FramebufferId,
    width: u32,
    height: u32,
    released: bool,
}

impl FrameTarget {
    /// Allocate one surface per spec plus a framebuffer binding all of them
    ///
    /// Specs are validated before the backend is touched. If any allocation
    /// fails, everything created so far is released before returning.
    pub fn new(backend: &mut dyn GpuBackend, label: &str, specs: &[AttachmentSpec]) -> Result<Self> {
        let (width, height) = validate_specs(specs)?;

        let mut attachments = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            match backend.create_surface(&format!("{}_{}", label, index), spec) {
                Ok(surface) => attachments.push(surface),
                Err(e) => {
                    release_surfaces(backend, &attachments);
                    return Err(e);
                }
            }
        }

        let framebuffer = match backend.create_framebuffer(label, &attachments) {
            Ok(fb) => fb,
            Err(e) => {
                release_surfaces(backend, &attachments);
                return Err(e);
            }
        };

        log::debug!("Created frame target '{}' ({}x{}, {} attachments)", label, width, height, specs.len());

        Ok(Self {
            label: label.to_string(),
            specs: specs.to_vec(),
            attachments,
            framebuffer,
            width,
            height,
            released: false,
        })
    }

    /// Make this target the draw destination with a full-size viewport
    pub fn bind(&self, bindings: &mut CurrentBindings) {
        bindings.bind_framebuffer(self.framebuffer, self.viewport());
    }

    /// Bind, then read the first attachment back as RGBA floats
    ///
    /// Blocks until the queue drains. Diagnostics only.
    pub fn bind_and_read(&self, backend: &mut dyn GpuBackend, bindings: &mut CurrentBindings) -> Result<Vec<f32>> {
        self.bind(bindings);
        backend.read_pixels(self.framebuffer, self.viewport())
    }

    /// Release every attachment and the framebuffer
    pub fn destroy(mut self, backend: &mut dyn GpuBackend) {
        backend.destroy_framebuffer(self.framebuffer);
        release_surfaces(backend, &self.attachments);
        self.released = true;
        log::debug!("Destroyed frame target '{}'", self.label);
    }

    /// Surfaces owned by this target, in attachment order
    pub fn attachments(&self) -> &[SurfaceId] {
        &self.attachments
    }

    pub fn specs(&self) -> &[AttachmentSpec] {
        &self.specs
    }

    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::full(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for FrameTarget {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "Frame target '{}' dropped without destroy, leaking {} surfaces",
                self.label,
                self.attachments.len()
            );
        }
    }
}

fn release_surfaces(backend: &mut dyn GpuBackend, surfaces: &[SurfaceId]) {
    for surface in surfaces {
        backend.destroy_surface(*surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::CountingBackend;
    use crate::render::target::PixelFormat;

    fn specs(count: usize) -> Vec<AttachmentSpec> {
        vec![AttachmentSpec::new(64, 64, PixelFormat::Rgba32Float); count]
    }

    #[test]
    fn test_create_allocates_n_plus_one() {
        let mut backend = CountingBackend::new();
        let target = FrameTarget::new(&mut backend, "acc", &specs(3)).unwrap();

        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 3);
        assert_eq!(counts.live_framebuffers, 1);
        assert_eq!(target.attachments().len(), 3);
        assert_eq!(backend.framebuffer_attachments(target.framebuffer()).unwrap(), target.attachments());

        target.destroy(&mut backend);
        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
        assert_eq!(counts.double_releases, 0);
    }

    #[test]
    fn test_mismatched_specs_touch_nothing() {
        let mut backend = CountingBackend::new();
        let specs = vec![
            AttachmentSpec::new(64, 64, PixelFormat::Rgba32Float),
            AttachmentSpec::new(32, 64, PixelFormat::Rgba32Float),
        ];
        let err = FrameTarget::new(&mut backend, "bad", &specs).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(backend.counts().surfaces_created, 0);
    }

    #[test]
    fn test_partial_failure_releases_everything() {
        let mut backend = CountingBackend::new().with_surface_budget(2);
        let err = FrameTarget::new(&mut backend, "acc", &specs(5)).unwrap_err();
        assert!(matches!(err, crate::core::error::Error::Resource(_)));

        let counts = backend.counts();
        assert_eq!(counts.surfaces_created, 2);
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
    }

    #[test]
    fn test_bind_sets_viewport() {
        let mut backend = CountingBackend::new();
        let target = FrameTarget::new(&mut backend, "t", &[AttachmentSpec::new(40, 20, PixelFormat::R8)]).unwrap();
        let mut bindings = CurrentBindings::new();
        target.bind(&mut bindings);

        assert_eq!(bindings.framebuffer(), Some((target.framebuffer(), Viewport::full(40, 20))));
        target.destroy(&mut backend);
    }

    #[test]
    fn test_bind_and_read_size() {
        let mut backend = CountingBackend::new();
        let target = FrameTarget::new(&mut backend, "t", &specs(2)).unwrap();
        let mut bindings = CurrentBindings::new();
        let pixels = target.bind_and_read(&mut backend, &mut bindings).unwrap();

        assert_eq!(pixels.len(), 64 * 64 * 4);
        target.destroy(&mut backend);
    }
}
