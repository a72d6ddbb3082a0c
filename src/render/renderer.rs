//! Progressive renderer driver
//!
//! Owns every GPU resource of one variant and sequences its stages:
//!
//! ```text
//! reset:  [generate] -> reset (write side) -> swap
//! render: [reset if pending] -> [generate] -> integrate (write side) -> swap -> render
//! ```
//!
//! Parameter changes never touch the GPU directly. They are classified by
//! [`decide`] and leave a pending reset that the next `render` performs.

use log::{debug, info};

use crate::core::config::RendererConfig;
use crate::core::error::Error;
use crate::core::rng::{RandomState, Seeds};
use crate::core::types::Result;
use crate::render::backend::{GpuBackend, SurfaceId};
use crate::render::bindings::CurrentBindings;
use crate::render::inputs::FrameInputs;
use crate::render::params::{ParameterChange, ParameterEffect, decide};
use crate::render::program::{ProgramSet, ShaderLibrary};
use crate::render::properties::{
    Properties, PropertyValue, TRANSFER_FUNCTION_SIZE, default_transfer_function,
};
use crate::render::target::{
    AttachmentSpec, Filter, FrameTarget, PingPongTarget, PixelFormat, SurfaceData, Wrap,
};
use crate::render::variant::{
    Capabilities, GenerateSchedule, RendererKind, StageContext, Variant,
};

const TRANSFER_FUNCTION: &str = "transferFunction";

/// Frame targets sized from a variant's capability descriptor
#[derive(Debug)]
pub struct Targets {
    pub generate: Option<FrameTarget>,
    pub accumulation: PingPongTarget,
    pub render: FrameTarget,
}

impl Targets {
    /// Allocate every target or nothing
    pub fn new(
        backend: &mut dyn GpuBackend,
        kind: RendererKind,
        caps: &Capabilities,
        resolution: u32,
    ) -> Result<Self> {
        let generate = match caps.generate {
            Some((group, _)) => Some(FrameTarget::new(
                backend,
                &format!("{}_generate", kind),
                &group.specs(resolution),
            )?),
            None => None,
        };

        let accumulation = match PingPongTarget::new(
            backend,
            &format!("{}_accumulation", kind),
            &caps.accumulation.specs(resolution),
        ) {
            Ok(accumulation) => accumulation,
            Err(e) => {
                if let Some(generate) = generate {
                    generate.destroy(backend);
                }
                return Err(e);
            }
        };

        let render = match FrameTarget::new(
            backend,
            &format!("{}_render", kind),
            &caps.render.specs(resolution),
        ) {
            Ok(render) => render,
            Err(e) => {
                accumulation.destroy(backend);
                if let Some(generate) = generate {
                    generate.destroy(backend);
                }
                return Err(e);
            }
        };

        Ok(Self {
            generate,
            accumulation,
            render,
        })
    }

    pub fn destroy(self, backend: &mut dyn GpuBackend) {
        if let Some(generate) = self.generate {
            generate.destroy(backend);
        }
        self.accumulation.destroy(backend);
        self.render.destroy(backend);
    }
}

/// Which target a stage draws into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Destination {
    Generate,
    Accumulation,
    Display,
}

/// A progressive volumetric renderer of one variant
#[derive(Debug)]
pub struct Renderer {
    variant: Variant,
    properties: Properties,
    rng: RandomState,
    seeds: Seeds,
    resolution: u32,
    frame: u32,
    programs: ProgramSet,
    targets: Targets,
    transfer_function: SurfaceId,
    bindings: CurrentBindings,
    needs_reset: bool,
}

impl Renderer {
    /// Build a renderer from `config`
    ///
    /// The variant name and parameter overrides are validated before any GPU
    /// resource is created. Allocation is all-or-nothing.
    pub fn new(
        backend: &mut dyn GpuBackend,
        library: &ShaderLibrary,
        config: &RendererConfig,
    ) -> Result<Self> {
        let kind = RendererKind::from_name(&config.variant)?;
        if config.resolution == 0 {
            return Err(Error::config("renderer resolution must be positive"));
        }

        let mut properties = Properties::new(kind.properties());
        for (name, value) in &config.parameters {
            properties.set(name, value.clone())?;
        }
        let variant = Variant::new(kind, &properties)?;
        let caps = kind.capabilities();

        let programs = ProgramSet::build(backend, library, kind, caps)?;

        let transfer_function =
            match backend.create_surface("transfer_function", &transfer_function_spec(&properties)) {
                Ok(surface) => surface,
                Err(e) => {
                    programs.destroy(backend);
                    return Err(e);
                }
            };

        let targets = match Targets::new(backend, kind, caps, config.resolution) {
            Ok(targets) => targets,
            Err(e) => {
                backend.destroy_surface(transfer_function);
                programs.destroy(backend);
                return Err(e);
            }
        };

        info!(
            "Created '{}' renderer at {}x{} ({} surfaces, {} programs)",
            kind,
            config.resolution,
            config.resolution,
            caps.surface_count() + 1,
            programs.len()
        );

        Ok(Self {
            variant,
            properties,
            rng: RandomState::new(config.seed),
            seeds: Seeds::default(),
            resolution: config.resolution,
            frame: 0,
            programs,
            targets,
            transfer_function,
            bindings: CurrentBindings::new(),
            needs_reset: true,
        })
    }

    pub fn kind(&self) -> RendererKind {
        self.variant.kind()
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Frames integrated since the last reset
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn seeds(&self) -> Seeds {
        self.seeds
    }

    /// Whether the next `render` will reset first
    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }

    pub fn accumulation(&self) -> &PingPongTarget {
        &self.targets.accumulation
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn transfer_function_surface(&self) -> SurfaceId {
        self.transfer_function
    }

    /// The final composited image
    pub fn display_attachment(&self) -> SurfaceId {
        // A frame target always holds at least one attachment
        self.targets.render.attachments()[0]
    }

    /// Restart accumulation from fresh seeds
    pub fn reset(&mut self, backend: &mut dyn GpuBackend, inputs: &FrameInputs<'_>) -> Result<()> {
        self.seeds = self.rng.seeds();
        self.frame = 0;
        self.variant.rebuild_derived(&self.properties)?;

        if self.targets.generate.is_some() {
            self.run_stage(backend, inputs, Destination::Generate, |v, ctx| v.generate(ctx))?;
        }
        self.run_stage(backend, inputs, Destination::Accumulation, |v, ctx| v.reset(ctx))?;
        self.targets.accumulation.swap();
        self.needs_reset = false;

        debug!(
            "Reset '{}' renderer, seeds ({:.4}, {:.4})",
            self.kind(),
            self.seeds.primary,
            self.seeds.secondary
        );
        Ok(())
    }

    /// Integrate one more frame and composite the display image
    pub fn render(&mut self, backend: &mut dyn GpuBackend, inputs: &FrameInputs<'_>) -> Result<()> {
        if self.needs_reset {
            self.reset(backend, inputs)?;
        }

        let caps = self.kind().capabilities();
        if let Some((_, GenerateSchedule::EveryFrame)) = caps.generate {
            self.run_stage(backend, inputs, Destination::Generate, |v, ctx| v.generate(ctx))?;
        }

        self.run_stage(backend, inputs, Destination::Accumulation, |v, ctx| v.integrate(ctx))?;
        self.targets.accumulation.swap();

        self.run_stage(backend, inputs, Destination::Display, |v, ctx| v.render(ctx))?;
        self.frame += 1;
        Ok(())
    }

    /// Set a property and react to the change
    pub fn set_parameter(
        &mut self,
        backend: &mut dyn GpuBackend,
        name: &str,
        value: PropertyValue,
    ) -> Result<ParameterEffect> {
        let change = self.properties.set(name, value)?;
        self.on_parameter_change(backend, &change)
    }

    /// React to a change already applied to the property store
    pub fn on_parameter_change(
        &mut self,
        backend: &mut dyn GpuBackend,
        change: &ParameterChange,
    ) -> Result<ParameterEffect> {
        let effect = decide(self.properties.descriptors(), change);
        debug!("Parameter '{}' changed: {:?}", change.name, effect);

        match effect {
            ParameterEffect::Ignore => {}
            ParameterEffect::Reset => {
                if change.name == TRANSFER_FUNCTION {
                    backend.write_surface(
                        self.transfer_function,
                        &transfer_function_spec(&self.properties),
                    )?;
                }
                self.needs_reset = true;
            }
            ParameterEffect::RebuildDerivedBuffer => {
                self.variant.rebuild_derived(&self.properties)?;
                self.needs_reset = true;
            }
        }
        Ok(effect)
    }

    /// Reallocate every resolution-dependent target
    ///
    /// The new targets are allocated before the old ones are released, so a
    /// failure leaves the renderer unchanged.
    pub fn set_resolution(&mut self, backend: &mut dyn GpuBackend, resolution: u32) -> Result<()> {
        if resolution == self.resolution {
            return Ok(());
        }
        if resolution == 0 {
            return Err(Error::config("renderer resolution must be positive"));
        }

        let kind = self.kind();
        let targets = Targets::new(backend, kind, kind.capabilities(), resolution)?;
        let old = std::mem::replace(&mut self.targets, targets);
        old.destroy(backend);

        info!(
            "Resized '{}' renderer {} -> {}",
            kind, self.resolution, resolution
        );
        self.resolution = resolution;
        self.variant.rebuild_derived(&self.properties)?;
        self.needs_reset = true;
        Ok(())
    }

    /// Synchronously read the display image back as RGBA floats
    ///
    /// Stalls the pipeline; meant for tests and offline output.
    pub fn read_display(&mut self, backend: &mut dyn GpuBackend) -> Result<Vec<f32>> {
        self.bindings.reset();
        self.targets.render.bind_and_read(backend, &mut self.bindings)
    }

    /// Release every resource the renderer allocated
    pub fn destroy(self, backend: &mut dyn GpuBackend) {
        let kind = self.kind();
        self.programs.destroy(backend);
        self.targets.destroy(backend);
        backend.destroy_surface(self.transfer_function);
        info!("Destroyed '{}' renderer", kind);
    }

    fn run_stage<F>(
        &mut self,
        backend: &mut dyn GpuBackend,
        inputs: &FrameInputs<'_>,
        destination: Destination,
        stage: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut Variant, &mut StageContext<'_>) -> Result<()>,
    {
        self.bindings.reset();
        match destination {
            Destination::Generate => self
                .targets
                .generate
                .as_ref()
                .ok_or_else(|| Error::Gpu(format!("renderer '{}' has no generate target", self.variant.kind())))?
                .bind(&mut self.bindings),
            Destination::Accumulation => self.targets.accumulation.bind(&mut self.bindings),
            Destination::Display => self.targets.render.bind(&mut self.bindings),
        }

        let mut ctx = StageContext::new(
            backend,
            &mut self.bindings,
            &self.programs,
            &self.targets,
            &self.properties,
            inputs,
            &mut self.rng,
            self.seeds,
            self.resolution,
            self.frame,
            self.transfer_function,
        );
        stage(&mut self.variant, &mut ctx)
    }
}

/// Lookup-table surface for the current transfer function
fn transfer_function_spec(properties: &Properties) -> AttachmentSpec {
    let table = properties
        .transfer_function(TRANSFER_FUNCTION)
        .map(<[u8]>::to_vec)
        .unwrap_or_else(|_| default_transfer_function());
    AttachmentSpec::new(TRANSFER_FUNCTION_SIZE as u32, 1, PixelFormat::Rgba8)
        .with_filter(Filter::Linear, Filter::Linear)
        .with_wrap(Wrap::ClampToEdge, Wrap::ClampToEdge)
        .with_data(SurfaceData::Bytes(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use crate::render::backend::{CountingBackend, Primitive};
    use crate::render::inputs::{EnvironmentTexture, Volume};
    use crate::render::variant::{GRID_SIZE, Stage};

    struct Scene {
        volume: Volume,
        camera: Camera,
        environment: EnvironmentTexture,
    }

    impl Scene {
        fn new(backend: &mut CountingBackend) -> Self {
            Self {
                volume: Volume::new(backend.import_texture("volume", 64, 64)),
                camera: Camera::default(),
                environment: EnvironmentTexture(backend.import_texture("environment", 16, 8)),
            }
        }

        fn inputs(&self) -> FrameInputs<'_> {
            FrameInputs::new(&self.volume, &self.camera, &self.environment)
        }
    }

    fn build(backend: &mut CountingBackend, config: &RendererConfig) -> Result<Renderer> {
        Renderer::new(backend, &ShaderLibrary::interface_only(), config)
    }

    #[test]
    fn test_basic_end_to_end() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("basic", 512)).unwrap();

        renderer.reset(&mut backend, &scene.inputs()).unwrap();
        let first = renderer.accumulation().read_index();
        for i in 0..10 {
            renderer.render(&mut backend, &scene.inputs()).unwrap();
            let expected = if i % 2 == 0 { 1 - first } else { first };
            assert_eq!(renderer.accumulation().read_index(), expected);
        }
        assert_eq!(renderer.frame(), 10);

        let display = renderer.display_attachment();
        let (width, height, format) = backend.surface_info(display).unwrap();
        assert_eq!((width, height), (512, 512));
        assert_eq!(format.channels(), 4);

        let pixels = renderer.read_display(&mut backend).unwrap();
        assert_eq!(pixels.len(), 512 * 512 * 4);

        renderer.destroy(&mut backend);
        let counts = backend.counts();
        assert_eq!(counts.live_surfaces, 0);
        assert_eq!(counts.live_framebuffers, 0);
        assert_eq!(counts.live_programs, 0);
    }

    #[test]
    fn test_basic_draw_shapes() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("basic", 256)).unwrap();
        renderer.reset(&mut backend, &scene.inputs()).unwrap();
        backend.clear_draws();

        renderer.render(&mut backend, &scene.inputs()).unwrap();
        let draws = backend.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].primitive, Primitive::Points);
        assert_eq!(draws[0].vertex_count, GRID_SIZE * GRID_SIZE);
        assert_eq!(draws[0].draw_buffers, 2);
        assert_eq!(draws[1].viewport.width, 256);
    }

    #[test]
    fn test_render_before_reset_resets_first() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("mcm", 64)).unwrap();
        assert!(renderer.needs_reset());

        renderer.render(&mut backend, &scene.inputs()).unwrap();
        assert!(!renderer.needs_reset());
        // reset + integrate + render
        assert_eq!(backend.draws().len(), 3);
        assert_eq!(renderer.frame(), 1);
        renderer.destroy(&mut backend);
    }

    #[test]
    fn test_every_variant_runs() {
        for kind in RendererKind::ALL {
            let mut backend = CountingBackend::new();
            let scene = Scene::new(&mut backend);
            let mut renderer = build(&mut backend, &RendererConfig::new(kind.name(), 64))
                .unwrap_or_else(|e| panic!("{}: {}", kind, e));

            renderer.reset(&mut backend, &scene.inputs()).unwrap();
            for _ in 0..3 {
                renderer
                    .render(&mut backend, &scene.inputs())
                    .unwrap_or_else(|e| panic!("{}: {}", kind, e));
            }

            let caps = kind.capabilities();
            let counts = backend.counts();
            assert_eq!(counts.live_surfaces, caps.surface_count() + 1, "{}", kind);
            assert_eq!(counts.live_framebuffers, caps.framebuffer_count(), "{}", kind);
            assert_eq!(counts.live_programs, caps.stages.len(), "{}", kind);

            renderer.destroy(&mut backend);
            let counts = backend.counts();
            assert_eq!(counts.live_surfaces, 0, "{}", kind);
            assert_eq!(counts.live_framebuffers, 0, "{}", kind);
            assert_eq!(counts.live_programs, 0, "{}", kind);
            assert_eq!(counts.double_releases, 0, "{}", kind);
        }
    }

    #[test]
    fn test_generate_schedule() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut depth = build(&mut backend, &RendererConfig::new("depth", 32)).unwrap();
        depth.reset(&mut backend, &scene.inputs()).unwrap();
        backend.clear_draws();
        depth.render(&mut backend, &scene.inputs()).unwrap();
        // generated once on reset, then only integrate + render
        assert_eq!(backend.draws().len(), 2);
        depth.destroy(&mut backend);

        let mut mip = build(&mut backend, &RendererConfig::new("mip", 32)).unwrap();
        mip.reset(&mut backend, &scene.inputs()).unwrap();
        backend.clear_draws();
        mip.render(&mut backend, &scene.inputs()).unwrap();
        assert_eq!(backend.draws().len(), 3);
        mip.destroy(&mut backend);
    }

    #[test]
    fn test_reset_regenerates_helpers() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut depth = build(&mut backend, &RendererConfig::new("depth", 32)).unwrap();
        depth.render(&mut backend, &scene.inputs()).unwrap();

        let effect = depth
            .set_parameter(&mut backend, "steps", PropertyValue::Number(10.0))
            .unwrap();
        assert_eq!(effect, ParameterEffect::Reset);
        backend.clear_draws();
        depth.render(&mut backend, &scene.inputs()).unwrap();

        // generate -> reset -> integrate -> render
        let generate = depth.targets().generate.as_ref().unwrap().framebuffer();
        let display = depth.targets().render.framebuffer();
        let draws = backend.draws();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].framebuffer, generate);
        assert_eq!(draws.iter().filter(|d| d.framebuffer == generate).count(), 1);
        assert_ne!(draws[1].framebuffer, generate);
        assert_ne!(draws[1].framebuffer, display);
        assert_eq!(draws[3].framebuffer, display);
        depth.destroy(&mut backend);
    }

    #[test]
    fn test_integrate_reads_previous_frame() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("mcm", 32)).unwrap();
        renderer.reset(&mut backend, &scene.inputs()).unwrap();
        let read_side = renderer.accumulation().attachments().to_vec();
        backend.clear_draws();

        renderer.render(&mut backend, &scene.inputs()).unwrap();
        let integrate = &backend.draws()[0];
        for surface in &read_side {
            assert!(integrate.textures.contains(surface));
        }
        renderer.destroy(&mut backend);
    }

    #[test]
    fn test_lifecycle_with_rebuild() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("foveated", 128)).unwrap();
        renderer.render(&mut backend, &scene.inputs()).unwrap();

        let effect = renderer
            .set_parameter(&mut backend, "foveaX", PropertyValue::Number(0.2))
            .unwrap();
        assert_eq!(effect, ParameterEffect::RebuildDerivedBuffer);
        renderer.set_resolution(&mut backend, 64).unwrap();
        assert!(renderer.needs_reset());
        renderer.render(&mut backend, &scene.inputs()).unwrap();
        assert_eq!(renderer.frame(), 1);

        let caps = RendererKind::Foveated.capabilities();
        let before_destroy = backend.counts();
        // two full target sets were created, one released by the resize
        assert_eq!(
            before_destroy.surfaces_created,
            2 * caps.surface_count() + 1
        );
        renderer.destroy(&mut backend);

        let counts = backend.counts();
        assert_eq!(counts.surfaces_destroyed, counts.surfaces_created);
        assert_eq!(counts.framebuffers_destroyed, counts.framebuffers_created);
        assert_eq!(counts.programs_destroyed, counts.programs_created);
        assert_eq!(counts.double_releases, 0);
    }

    #[test]
    fn test_parameter_effects() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let mut renderer = build(&mut backend, &RendererConfig::new("mcm", 32)).unwrap();
        renderer.reset(&mut backend, &scene.inputs()).unwrap();

        let effect = renderer
            .set_parameter(&mut backend, "exposure", PropertyValue::Number(2.0))
            .unwrap();
        assert_eq!(effect, ParameterEffect::Ignore);
        assert!(!renderer.needs_reset());

        let effect = renderer
            .set_parameter(&mut backend, "extinction", PropertyValue::Number(4.0))
            .unwrap();
        assert_eq!(effect, ParameterEffect::Reset);
        assert!(renderer.needs_reset());

        let err = renderer
            .set_parameter(&mut backend, "extinction", PropertyValue::Bool(true))
            .unwrap_err();
        assert!(err.is_configuration());
        renderer.destroy(&mut backend);
    }

    #[test]
    fn test_transfer_function_change_uploads() {
        let mut backend = CountingBackend::new();
        let mut renderer = build(&mut backend, &RendererConfig::new("eam", 32)).unwrap();
        let table: Vec<u8> = (0..TRANSFER_FUNCTION_SIZE).flat_map(|_| [10, 20, 30, 40]).collect();

        renderer
            .set_parameter(&mut backend, TRANSFER_FUNCTION, PropertyValue::TransferFunction(table))
            .unwrap();
        match backend.surface_data(renderer.transfer_function_surface()) {
            Some(SurfaceData::Bytes(bytes)) => assert_eq!(&bytes[..4], &[10, 20, 30, 40]),
            other => panic!("unexpected transfer function contents: {:?}", other),
        }
        renderer.destroy(&mut backend);
    }

    #[test]
    fn test_unknown_variant_allocates_nothing() {
        let mut backend = CountingBackend::new();
        let err = build(&mut backend, &RendererConfig::new("nope", 64)).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(backend.counts(), Default::default());
    }

    #[test]
    fn test_bad_override_allocates_nothing() {
        let mut backend = CountingBackend::new();
        let config = RendererConfig::new("mcs", 64).with_parameter("bogus", PropertyValue::Number(1.0));
        assert!(build(&mut backend, &config).unwrap_err().is_configuration());
        assert_eq!(backend.counts().surfaces_created, 0);
    }

    #[test]
    fn test_failed_allocation_leaves_nothing_live() {
        let caps = RendererKind::Foveated.capabilities();
        for budget in 0..caps.surface_count() + 1 {
            let mut backend = CountingBackend::new().with_surface_budget(budget);
            let err = build(&mut backend, &RendererConfig::new("foveated", 64)).unwrap_err();
            assert!(matches!(err, Error::Resource(_)), "budget {}: {}", budget, err);
            let counts = backend.counts();
            assert_eq!(counts.live_surfaces, 0, "budget {}", budget);
            assert_eq!(counts.live_framebuffers, 0, "budget {}", budget);
            assert_eq!(counts.live_programs, 0, "budget {}", budget);
        }
    }

    #[test]
    fn test_missing_program_is_configuration_error() {
        let mut backend = CountingBackend::new();
        let mut library = ShaderLibrary::new();
        for requirement in RendererKind::Mip.capabilities().stages {
            if requirement.stage != Stage::Generate {
                library.insert(
                    "mip",
                    requirement.stage,
                    crate::render::program::ProgramSource::new("", requirement.uniforms),
                );
            }
        }
        let err = Renderer::new(&mut backend, &library, &RendererConfig::new("mip", 32)).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(backend.counts().live_programs, 0);
    }

    #[test]
    fn test_same_seed_same_seeds() {
        let mut backend = CountingBackend::new();
        let scene = Scene::new(&mut backend);
        let config = RendererConfig::new("mcs", 16).with_seed(99);
        let mut a = build(&mut backend, &config).unwrap();
        let mut b = build(&mut backend, &config).unwrap();
        a.reset(&mut backend, &scene.inputs()).unwrap();
        b.reset(&mut backend, &scene.inputs()).unwrap();
        assert_eq!(a.seeds(), b.seeds());
        a.destroy(&mut backend);
        b.destroy(&mut backend);
    }
}
