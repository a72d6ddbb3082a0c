//! Grid-scattering baseline
//!
//! Integrate scatters a GRID_SIZE² point cloud into a fixed BUFFER_SIZE²
//! colour/position pair and render splats the pair back to the display.

use crate::core::types::Result;
use crate::render::backend::Primitive;
use crate::render::properties::{PropertyDescriptor, descriptors};
use crate::render::target::PixelFormat;

use super::{
    BUFFER_SIZE, Capabilities, Extent, FULLSCREEN_VERTICES, GRID_SIZE, Stage, StageContext,
    StageRequirement, SurfaceGroup,
};

const ACCUMULATION: SurfaceGroup =
    SurfaceGroup::new(Extent::Fixed(BUFFER_SIZE), &[PixelFormat::Rgba32Float; 2]);

pub const CAPABILITIES: Capabilities = Capabilities {
    generate: None,
    accumulation: ACCUMULATION,
    render: SurfaceGroup::new(Extent::Display, &[PixelFormat::Rgba16Float]),
    stages: &[
        StageRequirement {
            stage: Stage::Integrate,
            uniforms: &[
                "uAccumulatedColor",
                "uAccumulatedPosition",
                "uLen",
                "uRandSeed",
                "uRandSeed2",
            ],
        },
        StageRequirement {
            stage: Stage::Render,
            uniforms: &["uColor", "uRandomPositionNormalized"],
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
        descriptors::anisotropy(),
        descriptors::bounces(),
        descriptors::steps("stepsMip", "Steps MIP", 1.0),
        descriptors::steps("stepsMCM", "Steps MCM", 8.0),
        descriptors::transfer_function(),
    ]
}

pub fn integrate(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Integrate)?;
    let color = ctx.accumulated(0)?;
    let position = ctx.accumulated(1)?;
    ctx.texture("uAccumulatedColor", color)?;
    ctx.texture("uAccumulatedPosition", position)?;
    ctx.int("uLen", GRID_SIZE as i32)?;
    ctx.float("uRandSeed", ctx.seeds.primary)?;
    ctx.float("uRandSeed2", ctx.seeds.secondary)?;
    ctx.draw(Primitive::Points, GRID_SIZE * GRID_SIZE, ACCUMULATION.count())
}

pub fn render(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Render)?;
    let color = ctx.accumulated(0)?;
    let position = ctx.accumulated(1)?;
    ctx.texture("uColor", color)?;
    ctx.texture("uRandomPositionNormalized", position)?;
    ctx.draw(Primitive::Points, BUFFER_SIZE * BUFFER_SIZE, 1)
}

pub fn reset(ctx: &mut StageContext<'_>) -> Result<()> {
    ctx.use_program(Stage::Reset)?;
    ctx.draw(Primitive::Triangles, FULLSCREEN_VERTICES, ACCUMULATION.count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_grid_accumulation() {
        let specs = CAPABILITIES.accumulation.specs(300);
        assert_eq!(specs.len(), 2);
        assert!(specs.iter().all(|s| s.width == BUFFER_SIZE && s.height == BUFFER_SIZE));
        assert_eq!(CAPABILITIES.render.specs(300)[0].width, 300);
    }
}
