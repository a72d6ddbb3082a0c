//! Headless backend that counts and validates every GPU operation
//!
//! Nothing is rasterized. Each allocation and release is tallied so lifecycle
//! tests can prove a renderer releases exactly what it created, and each draw
//! is checked for the hazards a real driver would reject or silently corrupt:
//! sampling a surface the draw also writes, and writing fewer attachments than
//! the framebuffer holds.

use std::collections::{HashMap, HashSet};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::backend::{
    DrawCall, FramebufferId, GpuBackend, Primitive, ProgramId, SurfaceId, Viewport,
};
use crate::render::program::ProgramSource;
use crate::render::target::{AttachmentSpec, PixelFormat, SurfaceData};

/// Snapshot of allocation counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub surfaces_created: usize,
    pub surfaces_destroyed: usize,
    pub live_surfaces: usize,
    pub framebuffers_created: usize,
    pub framebuffers_destroyed: usize,
    pub live_framebuffers: usize,
    pub programs_created: usize,
    pub programs_destroyed: usize,
    pub live_programs: usize,
    /// Releases of handles that were not live
    pub double_releases: usize,
}

/// One accepted draw
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub framebuffer: FramebufferId,
    pub viewport: Viewport,
    pub textures: Vec<SurfaceId>,
    pub draw_buffers: u32,
    pub primitive: Primitive,
    pub vertex_count: u32,
}

#[derive(Debug)]
struct SurfaceRecord {
    label: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    seed: Option<SurfaceData>,
    external: bool,
}

/// Resource-counting test backend
#[derive(Debug)]
pub struct CountingBackend {
    next_id: u32,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    framebuffers: HashMap<FramebufferId, Vec<SurfaceId>>,
    programs: HashSet<ProgramId>,
    counts: ResourceCounts,
    draws: Vec<DrawRecord>,
    /// Fail surface creation once this many surfaces have been created
    surface_budget: Option<usize>,
    max_dimension: u32,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            surfaces: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashSet::new(),
            counts: ResourceCounts::default(),
            draws: Vec::new(),
            surface_budget: None,
            max_dimension: 8192,
        }
    }

    /// Make the `budget + 1`-th surface allocation fail with a resource error
    pub fn with_surface_budget(mut self, budget: usize) -> Self {
        self.surface_budget = Some(budget);
        self
    }

    /// Register a host-owned texture such as a volume or environment map
    ///
    /// Imported surfaces are not counted as renderer allocations.
    pub fn import_texture(&mut self, label: &str, width: u32, height: u32) -> SurfaceId {
        let id = SurfaceId(self.allocate_id());
        self.surfaces.insert(
            id,
            SurfaceRecord {
                label: label.to_string(),
                width,
                height,
                format: PixelFormat::Rgba8,
                seed: None,
                external: true,
            },
        );
        id
    }

    pub fn counts(&self) -> ResourceCounts {
        let mut counts = self.counts;
        counts.live_surfaces = self.surfaces.values().filter(|s| !s.external).count();
        counts.live_framebuffers = self.framebuffers.len();
        counts.live_programs = self.programs.len();
        counts
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    /// Size and format of a live surface
    pub fn surface_info(&self, surface: SurfaceId) -> Option<(u32, u32, PixelFormat)> {
        self.surfaces.get(&surface).map(|s| (s.width, s.height, s.format))
    }

    pub fn surface_label(&self, surface: SurfaceId) -> Option<&str> {
        self.surfaces.get(&surface).map(|s| s.label.as_str())
    }

    /// Seed or last uploaded contents of a surface
    pub fn surface_data(&self, surface: SurfaceId) -> Option<&SurfaceData> {
        self.surfaces.get(&surface).and_then(|s| s.seed.as_ref())
    }

    pub fn framebuffer_attachments(&self, framebuffer: FramebufferId) -> Option<&[SurfaceId]> {
        self.framebuffers.get(&framebuffer).map(Vec::as_slice)
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for CountingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for CountingBackend {
    fn create_surface(&mut self, label: &str, spec: &AttachmentSpec) -> Result<SurfaceId> {
        spec.validate()?;
        if let Some(budget) = self.surface_budget {
            if self.counts.surfaces_created >= budget {
                return Err(Error::resource(format!("surface budget exhausted creating '{}'", label)));
            }
        }
        if spec.width > self.max_dimension || spec.height > self.max_dimension {
            return Err(Error::resource(format!(
                "'{}' is {}x{}, limit is {}",
                label, spec.width, spec.height, self.max_dimension
            )));
        }

        let id = SurfaceId(self.allocate_id());
        self.surfaces.insert(
            id,
            SurfaceRecord {
                label: label.to_string(),
                width: spec.width,
                height: spec.height,
                format: spec.format,
                seed: spec.initial_data.clone(),
                external: false,
            },
        );
        self.counts.surfaces_created += 1;
        Ok(id)
    }

    fn write_surface(&mut self, surface: SurfaceId, spec: &AttachmentSpec) -> Result<()> {
        spec.validate()?;
        let record = self
            .surfaces
            .get_mut(&surface)
            .ok_or_else(|| Error::Gpu(format!("write to unknown surface {:?}", surface)))?;
        if record.width != spec.width || record.height != spec.height || record.format != spec.format {
            return Err(Error::Gpu(format!("write layout mismatch on '{}'", record.label)));
        }
        record.seed = spec.initial_data.clone();
        Ok(())
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        match self.surfaces.remove(&surface) {
            Some(_) => self.counts.surfaces_destroyed += 1,
            None => self.counts.double_releases += 1,
        }
    }

    fn create_framebuffer(&mut self, _label: &str, attachments: &[SurfaceId]) -> Result<FramebufferId> {
        if let Some(missing) = attachments.iter().find(|s| !self.surfaces.contains_key(s)) {
            return Err(Error::resource(format!("framebuffer attachment {:?} is not live", missing)));
        }
        let id = FramebufferId(self.allocate_id());
        self.framebuffers.insert(id, attachments.to_vec());
        self.counts.framebuffers_created += 1;
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        match self.framebuffers.remove(&framebuffer) {
            Some(_) => self.counts.framebuffers_destroyed += 1,
            None => self.counts.double_releases += 1,
        }
    }

    fn create_program(&mut self, _label: &str, _source: &ProgramSource) -> Result<ProgramId> {
        let id = ProgramId(self.allocate_id());
        self.programs.insert(id);
        self.counts.programs_created += 1;
        Ok(id)
    }

    fn destroy_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program) {
            self.counts.programs_destroyed += 1;
        } else {
            self.counts.double_releases += 1;
        }
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        if !self.programs.contains(&call.program) {
            return Err(Error::Gpu(format!("draw with unknown program {:?}", call.program)));
        }
        let attachments = self
            .framebuffers
            .get(&call.framebuffer)
            .ok_or_else(|| Error::Gpu(format!("draw into unknown framebuffer {:?}", call.framebuffer)))?;

        if call.draw_buffers as usize != attachments.len() {
            return Err(Error::Gpu(format!(
                "draw writes {} of {} attachments",
                call.draw_buffers,
                attachments.len()
            )));
        }

        for texture in call.textures {
            if !self.surfaces.contains_key(texture) {
                return Err(Error::Gpu(format!("texture {:?} is not live", texture)));
            }
            if attachments.contains(texture) {
                let label = self.surface_label(*texture).unwrap_or("?");
                return Err(Error::Gpu(format!(
                    "feedback loop: '{}' is sampled and written by the same draw",
                    label
                )));
            }
        }

        self.draws.push(DrawRecord {
            program: call.program,
            framebuffer: call.framebuffer,
            viewport: call.viewport,
            textures: call.textures.to_vec(),
            draw_buffers: call.draw_buffers,
            primitive: call.primitive,
            vertex_count: call.vertex_count,
        });
        Ok(())
    }

    fn read_pixels(&mut self, framebuffer: FramebufferId, viewport: Viewport) -> Result<Vec<f32>> {
        let first = self
            .framebuffers
            .get(&framebuffer)
            .and_then(|a| a.first())
            .ok_or_else(|| Error::Gpu(format!("readback from unknown framebuffer {:?}", framebuffer)))?;
        let record = self
            .surfaces
            .get(first)
            .ok_or_else(|| Error::Gpu(format!("readback from released surface {:?}", first)))?;

        let texels = viewport.width as usize * viewport.height as usize;
        let mut out = vec![0.0; texels * 4];

        // Seeded surfaces read back their seed, expanded to RGBA
        if let Some(seed) = &record.seed {
            let channels = record.format.channels() as usize;
            let value = |i: usize| match seed {
                SurfaceData::Bytes(b) => b[i] as f32 / 255.0,
                SurfaceData::Floats(f) => f[i],
            };
            let limit = texels.min(record.width as usize * record.height as usize);
            for texel in 0..limit {
                for c in 0..channels {
                    out[texel * 4 + c] = value(texel * channels + c);
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::bindings::CurrentBindings;

    fn spec(w: u32, h: u32) -> AttachmentSpec {
        AttachmentSpec::new(w, h, PixelFormat::Rgba32Float)
    }

    #[test]
    fn test_counts_track_create_and_destroy() {
        let mut backend = CountingBackend::new();
        let a = backend.create_surface("a", &spec(4, 4)).unwrap();
        let fb = backend.create_framebuffer("fb", &[a]).unwrap();

        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 1);
        assert_eq!(counts.live_framebuffers, 1);

        backend.destroy_framebuffer(fb);
        backend.destroy_surface(a);
        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
        assert_eq!(counts.double_releases, 0);
    }

    #[test]
    fn test_double_release_counted() {
        let mut backend = CountingBackend::new();
        let a = backend.create_surface("a", &spec(4, 4)).unwrap();
        backend.destroy_surface(a);
        backend.destroy_surface(a);
        assert_eq!(backend.counts().double_releases, 1);
    }

    #[test]
    fn test_surface_budget() {
        let mut backend = CountingBackend::new().with_surface_budget(1);
        assert!(backend.create_surface("a", &spec(4, 4)).is_ok());
        let err = backend.create_surface("b", &spec(4, 4)).unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
    }

    #[test]
    fn test_feedback_loop_rejected() {
        let mut backend = CountingBackend::new();
        let a = backend.create_surface("a", &spec(4, 4)).unwrap();
        let fb = backend.create_framebuffer("fb", &[a]).unwrap();
        let program = backend.create_program("p", &ProgramSource::default()).unwrap();

        let mut bindings = CurrentBindings::new();
        bindings.bind_framebuffer(fb, Viewport::full(4, 4));
        bindings.use_program(program);
        bindings.bind_texture(a);

        let call = bindings.draw_call(Primitive::Triangles, 3, 1).unwrap();
        let err = backend.draw(&call).unwrap_err();
        assert!(err.to_string().contains("feedback loop"));
    }

    #[test]
    fn test_partial_mrt_write_rejected() {
        let mut backend = CountingBackend::new();
        let a = backend.create_surface("a", &spec(4, 4)).unwrap();
        let b = backend.create_surface("b", &spec(4, 4)).unwrap();
        let fb = backend.create_framebuffer("fb", &[a, b]).unwrap();
        let program = backend.create_program("p", &ProgramSource::default()).unwrap();

        let mut bindings = CurrentBindings::new();
        bindings.bind_framebuffer(fb, Viewport::full(4, 4));
        bindings.use_program(program);

        let partial = bindings.draw_call(Primitive::Triangles, 3, 1).unwrap();
        assert!(backend.draw(&partial).is_err());

        let full = bindings.draw_call(Primitive::Triangles, 3, 2).unwrap();
        assert!(backend.draw(&full).is_ok());
        assert_eq!(backend.draws().len(), 1);
    }

    #[test]
    fn test_readback_returns_seed() {
        let mut backend = CountingBackend::new();
        let seeded = AttachmentSpec::new(2, 1, PixelFormat::R8)
            .with_data(SurfaceData::Bytes(vec![255, 0]));
        let a = backend.create_surface("a", &seeded).unwrap();
        let fb = backend.create_framebuffer("fb", &[a]).unwrap();

        let pixels = backend.read_pixels(fb, Viewport::full(2, 1)).unwrap();
        assert_eq!(pixels, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_malformed_seed_rejected() {
        let mut backend = CountingBackend::new();
        let short = AttachmentSpec::new(2, 2, PixelFormat::R8).with_data(SurfaceData::Bytes(vec![255]));
        assert!(backend.create_surface("short", &short).unwrap_err().is_configuration());
        let empty = AttachmentSpec::new(0, 4, PixelFormat::R8);
        assert!(backend.create_surface("empty", &empty).unwrap_err().is_configuration());
        assert_eq!(backend.counts().surfaces_created, 0);

        let a = backend.create_surface("a", &AttachmentSpec::new(2, 2, PixelFormat::R8)).unwrap();
        assert!(backend.write_surface(a, &short).unwrap_err().is_configuration());
        let wrong_type = AttachmentSpec::new(2, 2, PixelFormat::R8).with_data(SurfaceData::Floats(vec![0.0; 4]));
        assert!(backend.write_surface(a, &wrong_type).is_err());
        assert!(backend.write_surface(a, &spec(2, 2)).is_err());
    }
}
