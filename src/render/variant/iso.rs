//! First-hit isosurface rendering
//!
//! Generate marches to the isovalue with a jittered start, integrate keeps
//! the closest hit seen so far and render shades it. Light direction and
//! diffuse colour only affect shading, so changing them never resets.

use crate::core::types::Result;
use crate::render::backend::{Primitive, UniformValue};
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
                "uStepSize",
                "uOffset",
                "uIsovalue",
                "uMvpInverseMatrix",
            ],
        },
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &["uAccumulator", "uFrame"],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uClosest", "uVolume", "uLight", "uDiffuse"],
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
        PropertyDescriptor::number("isovalue", "Isovalue", PropertyKind::Slider, 0.5)
            .bounds(Some(0.0), Some(1.0)),
        descriptors::color("light", "Light direction", [1.0, 1.0, 1.0], PropertyKind::Vector),
        descriptors::color("diffuse", "Diffuse color", [0.8, 0.8, 0.8], PropertyKind::Color),
    ]
}

pub fn generate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Generate)?;
    ctx.volume("uVolume")?;
    ctx.float("uStepSize", 1.0 / ctx.props.number("steps")?.max(1.0))?;
    let offset = ctx.rng.next_f32();
    ctx.float("uOffset", offset)?;
    ctx.float("uIsovalue", ctx.props.number("isovalue")?)?;
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
    let closest = ctx.accumulated(0)?;
    ctx.texture("uClosest", closest)?;
    ctx.volume("uVolume")?;
    ctx.uniform("uLight", UniformValue::Vec3(ctx.props.vec3("light")?))?;
    ctx.uniform("uDiffuse", UniformValue::Vec3(ctx.props.vec3("diffuse")?))?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::params::{ParameterChange, ParameterEffect, decide};
    use crate::render::properties::PropertyValue;

    #[test]
    fn test_shading_changes_are_cosmetic() {
        let props = properties();
        let light = ParameterChange::new(
            "light",
            PropertyValue::Vec3([1.0, 1.0, 1.0]),
            PropertyValue::Vec3([0.0, 1.0, 0.0]),
        );
        assert_eq!(decide(&props, &light), ParameterEffect::Ignore);

        let iso = ParameterChange::new("isovalue", PropertyValue::Number(0.5), PropertyValue::Number(0.3));
        assert_eq!(decide(&props, &iso), ParameterEffect::Reset);
    }
}
