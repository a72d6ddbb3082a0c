//! Monte Carlo multiple scattering
//!
//! Path state lives in four display-sized surfaces: position, direction,
//! transmittance and radiance. Each integrate advances every path by up to
//! `steps` delta-tracking events; finished paths restart from the camera.

use crate::core::types::Result;
use crate::render::backend::Primitive;
use crate::render::properties::{PropertyDescriptor, descriptors};
use crate::render::target::PixelFormat;

use super::{
    Capabilities, Extent, FULLSCREEN_VERTICES, Stage, StageContext, StageRequirement,
    SurfaceGroup,
};

const ACCUMULATION: SurfaceGroup =
    SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float; 4]);

const PATH_STATE: [&str; 4] = ["uPosition", "uDirection", "uTransmittance", "uRadiance"];

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: None,
    accumulation: ACCUMULATION,
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba8]).linear(),
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
                "uMvpInverseMatrix",
                "uInverseResolution",
                "uRandSeed",
                "uBlur",
                "uExtinction",
                "uAnisotropy",
                "uMaxBounces",
                "uSteps",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uColor", "uExposure"],
        },
        StageRequirement {
            stage: Stage::Reset,
            uniforms: &["uMvpInverseMatrix", "uInverseResolution", "uRandSeed", "uBlur"],
        },
    ],
};

pub fn properties() -> Vec<PropertyDescriptor> {
    vec![
        descriptors::extinction(),
        descriptors::anisotropy(),
        descriptors::bounces(),
        descriptors::steps("steps", "Steps", 8.0),
        descriptors::exposure(),
        descriptors::transfer_function(),
    ]
}

pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    for (index, name) in PATH_STATE.into_iter().enumerate() {
        let surface = ctx.accumulated(index)?;
        ctx.texture(name, surface)?;
    }
    ctx.volume("uVolume")?;
    ctx.environment("uEnvironment")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.mvp_inverse()?;
    ctx.inverse_resolution()?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.float("uBlur", 0.0)?;
    ctx.float("uExtinction", ctx.props.number("extinction")?)?;
    ctx.float("uAnisotropy", ctx.props.number("anisotropy")?)?;
    ctx.uint("uMaxBounces", ctx.props.count("bounces")?)?;
    ctx.uint("uSteps", ctx.props.count("steps")?)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, ACCUMULATION.count())
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let radiance = ctx.accumulated(3)?;
    ctx.texture("uColor", radiance)?;
    ctx.float("uExposure", ctx.props.number("exposure")?)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

pub fn reset(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Reset)?;
    ctx.mvp_inverse()?;
    ctx.inverse_resolution()?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.float("uBlur", 0.0)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, ACCUMULATION.count())
}
