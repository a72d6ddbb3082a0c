//! Depth of the first opaque sample
//!
//! Depth carries no jitter, so generate runs only on reset and integrate
//! folds the cached frame into the accumulator.

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
        SurfaceGroup::new(Extent::Display, &[PixelFormat::R32Float]),
        GenerateSchedule::OnReset,
    )),
    accumulation: SurfaceGroup::new(Extent::Display, &[PixelFormat::R32Float]),
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba8]).linear(),
    stages: &[
        StageRequirement {
            stage: Stage::Generate,
            uniforms: &[
                "uVolume",
                "uTransferFunction",
                "uStepSize",
                "uMvpInverseMatrix",
            ],
        },
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &["uAccumulator", "uFrame"],
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
        descriptors::transfer_function(),
    ]
}

pub fn generate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Generate)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.float("uStepSize", 1.0 / ctx.props.number("steps")?.max(1.0))?;
    ctx.mvp_inverse()?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let accumulator = ctx.accumulated(0)?;
    let frame = ctx.generated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.texture("uFrame", frame)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let accumulator = ctx.accumulated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}
