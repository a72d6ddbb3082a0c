//! Local ambient occlusion
//!
//! Generate finds the first opaque hit; integrate fires a few occlusion
//! rays around it each frame and averages them into the accumulator.

use crate::core::types::Result;
use crate::render::backend::Primitive;
use crate::render::properties::{PropertyDescriptor, PropertyKind, descriptors};
use crate::render::target::PixelFormat;

use super::{
    Capabilities, Extent, FULLSCREEN_VERTICES, GenerateSchedule, Stage, StageContext,
    StageRequirement, SurfaceGroup,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: Some((
        SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float]),
        GenerateSchedule::EveryFrame,
    )),
    accumulation: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float]),
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba8]).linear(),
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
                "uAccumulator",
                "uFrame",
                "uVolume",
                "uTransferFunction",
                "uSamples",
                "uRadius",
                "uRandSeed",
                "uMix",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uAccumulator"],
        },
        StageRequirement {
            stage: Stage::Reset,
            uniforms: &[],
        },
    ],
};

pub fn properties() -> Vec<PropertyDescriptor> {
    vec![
        descriptors::steps("steps", "Steps", 64.0),
        descriptors::steps("samples", "Occlusion samples", 8.0),
        PropertyDescriptor::number("radius", "Occlusion radius", PropertyKind::Spinner, 0.1)
            .bounds(Some(0.0), Some(1.0)),
        descriptors::transfer_function(),
    ]
}

pub fn generate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Generate)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.float("uStepSize", 1.0 / ctx.props.number("steps")?.max(1.0))?;
    let offset = ctx.rng.next_f32();
    ctx.float("uOffset", offset)?;
    ctx.mvp_inverse()?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let accumulator = ctx.accumulated(0)?;
    let hits = ctx.generated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.texture("uFrame", hits)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.uint("uSamples", ctx.props.count("samples")?)?;
    ctx.float("uRadius", ctx.props.number("radius")?)?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.float("uMix", 1.0 / (ctx.frame as f32 + 1.0))?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let accumulator = ctx.accumulated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}
