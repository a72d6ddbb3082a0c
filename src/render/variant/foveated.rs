//! Foveated multiple-scattering variants
//!
//! Both variants trace the same five-surface path state as the grid baseline
//! but bias where new paths start. On every reset an [`ImportanceQuadTree`]
//! is built around the gaze point and each integrate draws a fixed batch of
//! screen regions from it.
//!
//! `foveated` also runs a per-frame MIP generate pass that the integrate
//! kernel uses as a coarse occupancy mask. `foveated2` skips it and renders
//! by splatting ray positions straight from the accumulation state.

use glam::Vec2;
use log::debug;

use crate::core::types::Result;
use crate::render::backend::{Primitive, UniformValue};
use crate::render::properties::{Properties, PropertyDescriptor, descriptors};
use crate::render::target::PixelFormat;
use crate::sampling::{FoveaScore, ImportanceQuadTree};

use super::{
    BUFFER_SIZE, Capabilities, Extent, FULLSCREEN_VERTICES, GRID_SIZE, GenerateSchedule, Stage,
    StageContext, StageRequirement, SurfaceGroup,
};

/// Quadtree depth: 32x32 leaves
pub const FOVEA_DEPTH: u32 = 6;
/// Scoring samples per leaf side
pub const FOVEA_SUPERSAMPLES: u32 = 4;
/// Regions drawn per integrate
pub const REGIONS_PER_FRAME: usize = 16;

/// position, direction, transmittance, radiance, ray position
const ACCUMULATION: SurfaceGroup =
    SurfaceGroup::new(Extent::Fixed(BUFFER_SIZE), &[PixelFormat::Rgba32Float; 5]);

const RESET: StageRequirement = StageRequirement {
    stage: Stage::Reset,
    uniforms: &["uInverseResolution", "uRandSeed", "uBlur", "uMvpInverseMatrix"],
};

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: Some((
        SurfaceGroup::new(Extent::Display, &[PixelFormat::R8]),
        GenerateSchedule::EveryFrame,
    )),
    accumulation: ACCUMULATION,
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba16Float]),
    stages: &[
        StageRequirement {
            stage: Stage::Generate,
            uniforms: &[
                "uVolume",
                "uTransferFunction",
                "uStepSize",
                "uOffset",
                "uMvpInverseMatrix",
            ],
        },
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &[
                "uFrame",
                "uPosition",
                "uDirection",
                "uTransmittance",
                "uRadiance",
                "uVolume",
                "uEnvironment",
                "uTransferFunction",
                "uInverseResolution",
                "uBlur",
                "uExtinction",
                "uAnisotropy",
                "uMaxBounces",
                "uSteps",
                "uRandSeed",
                "uRandSeed2",
                "uMvpInverseMatrix",
                "uLen",
                "uFoveaRegions",
                "uFoveaRegionCount",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uColor", "uRandomPositionNormalized"],
        },
        RESET,
    ],
};

pub const CAPABILITIES_V2: Capabilities = Capabilities {
    generate: None,
    accumulation: ACCUMULATION,
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float]),
    stages: &[
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &[
                "uPosition",
                "uDirection",
                "uTransmittance",
                "uRadiance",
                "uVolume",
                "uEnvironment",
                "uTransferFunction",
                "uInverseResolution",
                "uRandSeed",
                "uBlur",
                "uExtinction",
                "uAnisotropy",
                "uMaxBounces",
                "uSteps",
                "uMvpInverseMatrix",
                "uLen",
                "uFoveaRegions",
                "uFoveaRegionCount",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uPositionRay", "uLen"],
        },
        RESET,
    ],
};

pub fn properties() -> Vec<PropertyDescriptor> {
    vec![
        descriptors::extinction(),
        descriptors::anisotropy(),
        descriptors::bounces(),
        descriptors::steps("stepsMIP", "Steps MIP", 1.0),
        descriptors::steps("stepsMCM", "Steps MCM", 8.0),
        descriptors::transfer_function(),
        descriptors::fovea_x(),
        descriptors::fovea_y(),
        descriptors::fovea_radius(),
    ]
}

pub fn properties_v2() -> Vec<PropertyDescriptor> {
    vec![
        descriptors::extinction(),
        descriptors::anisotropy(),
        descriptors::bounces(),
        descriptors::steps("steps", "Steps", 8.0),
        descriptors::transfer_function(),
        descriptors::fovea_x(),
        descriptors::fovea_y(),
        descriptors::fovea_radius(),
    ]
}

/// Importance map around the current gaze point
#[derive(Clone, Debug)]
pub struct FoveatedState {
    score: FoveaScore,
    tree: ImportanceQuadTree,
}

impl FoveatedState {
    pub fn new(props: &Properties) -> Result<Self> {
        let score = fovea_score(props)?;
        Ok(Self {
            tree: build_tree(&score)?,
            score,
        })
    }

    /// Rebuild the tree if the gaze parameters moved
    pub fn rebuild(&mut self, props: &Properties) -> Result<()> {
        let score = fovea_score(props)?;
        if score != self.score {
            debug!(
                "Rebuilding fovea map at ({:.3}, {:.3}) radius {:.3}",
                score.center.x, score.center.y, score.radius
            );
            self.tree = build_tree(&score)?;
            self.score = score;
        }
        Ok(())
    }

    pub fn tree(&self) -> &ImportanceQuadTree {
        &self.tree
    }

    pub fn score(&self) -> &FoveaScore {
        &self.score
    }

    fn regions(&self, ctx: &mut StageContext<'_>) -> Vec<[f32; 4]> {
        (0..REGIONS_PER_FRAME)
            .map(|_| self.tree.sample(ctx.rng).to_array())
            .collect()
    }
}

fn fovea_score(props: &Properties) -> Result<FoveaScore> {
    let center = Vec2::new(props.number("foveaX")?, props.number("foveaY")?);
    Ok(FoveaScore::new(center, props.number("foveaRadius")?))
}

fn build_tree(score: &FoveaScore) -> Result<ImportanceQuadTree> {
    ImportanceQuadTree::build(FOVEA_DEPTH, FOVEA_SUPERSAMPLES, |p| score.score(p))
}

pub fn generate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Generate)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    let steps = ctx.props.number("stepsMIP")?.max(1.0);
    ctx.float("uStepSize", 1.0 / steps)?;
    let offset = ctx.rng.next_f32();
    ctx.float("uOffset", offset)?;
    ctx.mvp_inverse()?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

/// Bind the four path-state surfaces of the READ side
fn bind_path_state(ctx: &mut StageContext<'_>) -> Result<()> {
    for (index, name) in ["uPosition", "uDirection", "uTransmittance", "uRadiance"]
        .into_iter()
        .enumerate()
    {
        let surface = ctx.accumulated(index)?;
        ctx.texture(name, surface)?;
    }
    Ok(())
}

fn bind_medium(ctx: &mut StageContext<'_>, steps: &str) -> Result<()> {
    ctx.volume("uVolume")?;
    ctx.environment("uEnvironment")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.inverse_resolution()?;
    ctx.float("uBlur", 0.0)?;
    ctx.float("uExtinction", ctx.props.number("extinction")?)?;
    ctx.float("uAnisotropy", ctx.props.number("anisotropy")?)?;
    ctx.uint("uMaxBounces", ctx.props.count("bounces")?)?;
    ctx.uint("uSteps", ctx.props.count(steps)?)?;
    ctx.int("uLen", GRID_SIZE as i32)
}

fn bind_regions(state: &FoveatedState, ctx: &mut StageContext<'_>) -> Result<()> {
    let regions = state.regions(ctx);
    ctx.uint("uFoveaRegionCount", regions.len() as u32)?;
    ctx.uniform("uFoveaRegions", UniformValue::Vec4Array(regions))
}

pub fn integrate(state: &mut FoveatedState, ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let frame = ctx.generated(0)?;
    ctx.texture("uFrame", frame)?;
    bind_path_state(ctx)?;
    bind_medium(ctx, "stepsMCM")?;
    ctx.float("uRandSeed", ctx.seeds.primary)?;
    ctx.float("uRandSeed2", ctx.seeds.secondary)?;
    ctx.mvp_inverse()?;
    bind_regions(state, ctx)?;
    ctx.draw(Primitive::Points, GRID_SIZE * GRID_SIZE, ACCUMULATION.count())
}

pub fn integrate_v2(state: &mut FoveatedState, ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    bind_path_state(ctx)?;
    bind_medium(ctx, "steps")?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.mvp_inverse()?;
    bind_regions(state, ctx)?;
    ctx.draw(Primitive::Points, GRID_SIZE * GRID_SIZE, ACCUMULATION.count())
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let radiance = ctx.accumulated(3)?;
    let ray_position = ctx.accumulated(4)?;
    ctx.texture("uColor", radiance)?;
    ctx.texture("uRandomPositionNormalized", ray_position)?;
    ctx.draw(Primitive::Points, BUFFER_SIZE * BUFFER_SIZE, 1)
}

pub fn render_v2(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let ray_position = ctx.accumulated(4)?;
    ctx.texture("uPositionRay", ray_position)?;
    ctx.int("uLen", GRID_SIZE as i32)?;
    ctx.draw(Primitive::Points, GRID_SIZE * GRID_SIZE, 1)
}

/// Start every path from the camera: all five surfaces are written
pub fn reset(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Reset)?;
    ctx.inverse_resolution()?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.float("uBlur", 0.0)?;
    ctx.mvp_inverse()?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, ACCUMULATION.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::properties::PropertyValue;
    use crate::sampling::NodeId;

    #[test]
    fn test_tree_peaks_at_gaze() {
        let mut props = Properties::new(properties());
        props.set("foveaX", PropertyValue::Number(0.1)).unwrap();
        props.set("foveaY", PropertyValue::Number(0.1)).unwrap();
        let state = FoveatedState::new(&props).unwrap();

        let p = state.tree().node_probabilities(NodeId::ROOT);
        assert!(p[0] > p[3], "gaze quadrant should dominate: {:?}", p);
    }

    #[test]
    fn test_rebuild_tracks_gaze() {
        let mut props = Properties::new(properties_v2());
        let mut state = FoveatedState::new(&props).unwrap();
        assert_eq!(state.score().center, Vec2::splat(0.5));

        props.set("foveaX", PropertyValue::Number(0.9)).unwrap();
        state.rebuild(&props).unwrap();
        assert_eq!(state.score().center, Vec2::new(0.9, 0.5));
        let p = state.tree().node_probabilities(NodeId::ROOT);
        assert!(p[1] > p[0]);
    }

    #[test]
    fn test_both_layouts_share_accumulation() {
        assert_eq!(CAPABILITIES.accumulation, CAPABILITIES_V2.accumulation);
        assert_eq!(CAPABILITIES.accumulation.count(), 5);
        assert!(CAPABILITIES_V2.generate.is_none());
    }
}
