//! Maximum intensity projection

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
        SurfaceGroup::new(Extent::Display, &[PixelFormat::R8]),
        GenerateSchedule::EveryFrame,
    )),
    accumulation: SurfaceGroup::new(Extent::Display, &[PixelFormat::R8]),
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

/// One jittered max-march per frame
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

/// Running maximum of the accumulated and freshly generated frame
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
