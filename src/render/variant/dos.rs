//! Directional occlusion shading
//!
//! Slices the volume front to back, one slice per integrate. Colour and
//! occlusion travel together in two surfaces. Once every slice has been
//! composited further integrates pass the result through unchanged.

use crate::core::types::Result;
use crate::render::backend::Primitive;
use crate::render::properties::{PropertyDescriptor, PropertyKind, descriptors};
use crate::render::target::PixelFormat;

use super::{
    Capabilities, Extent, FULLSCREEN_VERTICES, Stage, StageContext, StageRequirement,
    SurfaceGroup,
};

/// colour, occlusion
const ACCUMULATION: SurfaceGroup =
    SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba32Float; 2]);

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: None,
    accumulation: ACCUMULATION,
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba8]).linear(),
    stages: &[
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &[
                "uColor",
                "uOcclusion",
                "uVolume",
                "uTransferFunction",
                "uMvpInverseMatrix",
                "uSlice",
                "uSlices",
                "uExtinction",
                "uAperture",
                "uRandSeed",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uColor"],
        },
        StageRequirement {
            stage: Stage::Reset,
            uniforms: &[],
        },
    ],
};

pub fn properties() -> Vec<PropertyDescriptor> {
    vec![
        descriptors::steps("slices", "Slices", 200.0),
        descriptors::extinction(),
        PropertyDescriptor::number("aperture", "Aperture", PropertyKind::Slider, 30.0)
            .bounds(Some(0.0), Some(89.0)),
        descriptors::transfer_function(),
    ]
}

/// Progress through the slice stack
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DosState {
    slice: u32,
}

impl DosState {
    pub fn slice(&self) -> u32 {
        self.slice
    }

    pub fn restart(&mut self) {
        self.slice = 0;
    }
}

pub fn integrate(state: &mut DosState, ctx: &mut StageContext<'_>) -> Result<()> {
    let slices = ctx.props.count("slices")?.max(1);
    ctx.use_program(Stage::Integrate)?;
    let color = ctx.accumulated(0)?;
    let occlusion = ctx.accumulated(1)?;
    ctx.texture("uColor", color)?;
    ctx.texture("uOcclusion", occlusion)?;
    ctx.volume("uVolume")?;
    ctx.transfer_function("uTransferFunction")?;
    ctx.mvp_inverse()?;
    ctx.uint("uSlice", state.slice)?;
    ctx.uint("uSlices", slices)?;
    ctx.float("uExtinction", ctx.props.number("extinction")?)?;
    ctx.float("uAperture", ctx.props.number("aperture")?.to_radians())?;
    let seed = ctx.rng.next_f32();
    ctx.float("uRandSeed", seed)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, ACCUMULATION.count())?;
    state.slice = (state.slice + 1).min(slices);
    Ok(())
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let color = ctx.accumulated(0)?;
    ctx.texture("uColor", color)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}
