//! Double-buffered frame targets for progressive accumulation
//!
//! A draw cannot sample a surface it is writing. Frame N therefore reads the
//! READ side (frame N-1) while writing the WRITE side, and the roles swap once
//! the integrate pass has been submitted. On a single in-order queue the swap
//! is the only synchronization needed.

use crate::core::types::Result;
use crate::render::backend::{GpuBackend, SurfaceId};
use crate::render::bindings::CurrentBindings;
use crate::render::target::attachment::AttachmentSpec;
use crate::render::target::frame_target::FrameTarget;

/// Two structurally identical frame targets and the index of the READ side
#[derive(Debug)]
pub struct PingPongTarget {
    targets: [FrameTarget; 2],
    read: usize,
}

impl PingPongTarget {
    /// Build both sides from one spec list
    pub fn new(backend: &mut dyn GpuBackend, label: &str, specs: &[AttachmentSpec]) -> Result<Self> {
        let first = FrameTarget::new(backend, &format!("{}_a", label), specs)?;
        let second = match FrameTarget::new(backend, &format!("{}_b", label), specs) {
            Ok(target) => target,
            Err(e) => {
                first.destroy(backend);
                return Err(e);
            }
        };

        Ok(Self {
            targets: [first, second],
            read: 0,
        })
    }

    /// Bind the WRITE side as the draw destination
    pub fn bind(&self, bindings: &mut CurrentBindings) {
        self.write_target().bind(bindings);
    }

    /// Exchange READ and WRITE roles. No data moves.
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    /// Surfaces of the READ side: the last fully written frame
    pub fn attachments(&self) -> &[SurfaceId] {
        self.read_target().attachments()
    }

    /// Surfaces of the WRITE side
    pub fn write_attachments(&self) -> &[SurfaceId] {
        self.write_target().attachments()
    }

    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn write_index(&self) -> usize {
        1 - self.read
    }

    pub fn read_target(&self) -> &FrameTarget {
        &self.targets[self.read]
    }

    pub fn write_target(&self) -> &FrameTarget {
        &self.targets[1 - self.read]
    }

    /// Read the READ side back for diagnostics
    pub fn bind_and_read(&self, backend: &mut dyn GpuBackend, bindings: &mut CurrentBindings) -> Result<Vec<f32>> {
        self.read_target().bind_and_read(backend, bindings)
    }

    pub fn width(&self) -> u32 {
        self.targets[0].width()
    }

    pub fn height(&self) -> u32 {
        self.targets[0].height()
    }

    /// Release both sides
    pub fn destroy(self, backend: &mut dyn GpuBackend) {
        let [a, b] = self.targets;
        a.destroy(backend);
        b.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::CountingBackend;
    use crate::render::target::PixelFormat;

    fn specs() -> Vec<AttachmentSpec> {
        vec![AttachmentSpec::new(16, 16, PixelFormat::Rgba32Float); 2]
    }

    #[test]
    fn test_swap_is_involution() {
        let mut backend = CountingBackend::new();
        let mut pp = PingPongTarget::new(&mut backend, "acc", &specs()).unwrap();

        let read = pp.attachments().to_vec();
        let write = pp.write_attachments().to_vec();
        pp.swap();
        assert_eq!(pp.attachments(), write.as_slice());
        assert_eq!(pp.write_attachments(), read.as_slice());
        pp.swap();
        assert_eq!(pp.attachments(), read.as_slice());
        assert_eq!(pp.write_attachments(), write.as_slice());

        pp.destroy(&mut backend);
    }

    #[test]
    fn test_read_and_write_never_alias() {
        let mut backend = CountingBackend::new();
        let mut pp = PingPongTarget::new(&mut backend, "acc", &specs()).unwrap();
        for _ in 0..5 {
            assert_ne!(pp.read_index(), pp.write_index());
            for surface in pp.attachments() {
                assert!(!pp.write_attachments().contains(surface));
            }
            pp.swap();
        }
        pp.destroy(&mut backend);
    }

    #[test]
    fn test_bind_targets_write_side() {
        let mut backend = CountingBackend::new();
        let mut pp = PingPongTarget::new(&mut backend, "acc", &specs()).unwrap();
        let mut bindings = CurrentBindings::new();

        pp.bind(&mut bindings);
        assert_eq!(bindings.framebuffer().unwrap().0, pp.write_target().framebuffer());
        pp.swap();
        pp.bind(&mut bindings);
        assert_eq!(bindings.framebuffer().unwrap().0, pp.write_target().framebuffer());

        pp.destroy(&mut backend);
    }

    #[test]
    fn test_lifecycle_counts() {
        let mut backend = CountingBackend::new();
        let pp = PingPongTarget::new(&mut backend, "acc", &specs()).unwrap();
        assert_eq!(backend.counts().live_surfaces, 4);
        assert_eq!(backend.counts().live_framebuffers, 2);

        pp.destroy(&mut backend);
        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
        assert_eq!(counts.double_releases, 0);
    }

    #[test]
    fn test_second_side_failure_releases_first() {
        let mut backend = CountingBackend::new().with_surface_budget(3);
        assert!(PingPongTarget::new(&mut backend, "acc", &specs()).is_err());
        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
    }
}
