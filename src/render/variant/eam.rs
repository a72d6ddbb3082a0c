//! Emission-absorption model
//!
//! Generate composites one full ray march per frame. With `random` enabled
//! the march start is jittered and integrate averages frames; without it
//! every frame is identical and accumulation converges after the first.

use crate::core::types::Result;
use crate::render::backend::Primitive;
use crate::render::properties::{PropertyDescriptor, descriptors};
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
                "uExtinction",
                "uMvpInverseMatrix",
            ],
        },
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &["uAccumulator", "uFrame", "uMix"],
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
        descriptors::extinction(),
        descriptors::steps("slices", "Slices", 64.0),
        descriptors::checkbox("random", "Random sampling", true),
        descriptors::transfer_function(),
    ]
}

pub fn generate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Generate)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.float("uStepSize", 1.0 / ctx.props.number("slices")?.max(1.0))?;
    let offset = if ctx.props.flag("random")? {
        ctx.rng.next_f32()
    } else {
        0.5
    };
    ctx.float("uOffset", offset)?;
    ctx.float("uExtinction", ctx.props.number("extinction")?)?;
    ctx.mvp_inverse()?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

/// Running mean: frame `n` contributes with weight `1 / (n + 1)`
pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let accumulator = ctx.accumulated(0)?;
    let frame = ctx.generated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.texture("uFrame", frame)?;
    ctx.float("uMix", 1.0 / (ctx.frame as f32 + 1.0))?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let accumulator = ctx.accumulated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}
