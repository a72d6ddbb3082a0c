//! Monte Carlo single scattering

use crate::core::types::Result;
use crate::render::backend::{Primitive, UniformValue};
use crate::render::properties::{PropertyDescriptor, descriptors};
use crate::render::target::PixelFormat;

use super::{
    Capabilities, Extent, FULLSCREEN_VERTICES, Stage, StageContext, StageRequirement,
    SurfaceGroup,
};

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: None,
    accumulation: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float]),
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba8]).linear(),
    stages: &[
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &[
                "uAccumulator",
                "uVolume",
                "uEnvironment",
                "uTransferFunction",
                "uMvpInverseMatrix",
                "uInverseResolution",
                "uOffset",
                "uExtinction",
                "uMix",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uAccumulator", "uExposure"],
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
        descriptors::exposure(),
        descriptors::transfer_function(),
    ]
}

/// One single-scattering path per pixel, averaged into the accumulator
pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let accumulator = ctx.accumulated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.volume("uVolume")?;
    ctx.environment("uEnvironment")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.mvp_inverse()?;
    ctx.inverse_resolution()?;
    let offset = [ctx.rng.next_f32(), ctx.rng.next_f32()];
    ctx.uniform("uOffset", UniformValue::Vec2(offset))?;
    ctx.float("uExtinction", ctx.props.number("extinction")?)?;
    ctx.float("uMix", 1.0 / (ctx.frame as f32 + 1.0))?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let accumulator = ctx.accumulated(0)?;
    ctx.texture("uAccumulator", accumulator)?;
    ctx.float("uExposure", ctx.props.number("exposure")?)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}
