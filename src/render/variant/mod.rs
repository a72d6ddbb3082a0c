//! Renderer variants
//!
//! The set of variants is closed. Each one lives in its own module with a
//! static [`Capabilities`] table, its property descriptors and one function
//! per stage. [`Variant`] carries whatever per-variant state survives between
//! frames and dispatches to the stage functions.

pub mod basic;
pub mod capability;
pub mod context;
pub mod depth;
pub mod dos;
pub mod eam;
pub mod foveated;
pub mod iso;
pub mod lao;
pub mod mcm;
pub mod mcs;
pub mod mip;

use std::fmt;
use std::str::FromStr;

pub use capability::{
    Capabilities, Extent, GenerateSchedule, Stage, StageRequirement, SurfaceGroup,
};
pub use context::StageContext;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::properties::{Properties, PropertyDescriptor};

use dos::DosState;
use foveated::FoveatedState;

/// Side of the fixed sample buffers used by the grid-scattering variants
pub const BUFFER_SIZE: u32 = 512;
/// Side of the point grid scattered into a [`BUFFER_SIZE`] buffer
pub const GRID_SIZE: u32 = BUFFER_SIZE * 2;
/// Vertices of the oversized fullscreen triangle
pub const FULLSCREEN_VERTICES: u32 = 3;

/// Renderer variant identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RendererKind {
    Basic,
    Foveated,
    Foveated2,
    Mip,
    Iso,
    Eam,
    Lao,
    Mcs,
    Mcm,
    Dos,
    Depth,
}

impl RendererKind {
    pub const ALL: [RendererKind; 11] = [
        Self::Basic,
        Self::Foveated,
        Self::Foveated2,
        Self::Mip,
        Self::Iso,
        Self::Eam,
        Self::Lao,
        Self::Mcs,
        Self::Mcm,
        Self::Dos,
        Self::Depth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Foveated => "foveated",
            Self::Foveated2 => "foveated2",
            Self::Mip => "mip",
            Self::Iso => "iso",
            Self::Eam => "eam",
            Self::Lao => "lao",
            Self::Mcs => "mcs",
            Self::Mcm => "mcm",
            Self::Dos => "dos",
            Self::Depth => "depth",
        }
    }

    /// Look a variant up by its registry name
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::config(format!("unknown renderer '{}'", name)))
    }

    pub fn capabilities(self) -> &'static Capabilities {
        match self {
            Self::Basic => &basic::CAPABILITIES,
            Self::Foveated => &foveated::CAPABILITIES,
            Self::Foveated2 => &foveated::CAPABILITIES_V2,
            Self::Mip => &mip::CAPABILITIES,
            Self::Iso => &iso::CAPABILITIES,
            Self::Eam => &eam::CAPABILITIES,
            Self::Lao => &lao::CAPABILITIES,
            Self::Mcs => &mcs::CAPABILITIES,
            Self::Mcm => &mcm::CAPABILITIES,
            Self::Dos => &dos::CAPABILITIES,
            Self::Depth => &depth::CAPABILITIES,
        }
    }

    /// Tunables the variant exposes, with their defaults
    pub fn properties(self) -> Vec<PropertyDescriptor> {
        match self {
            Self::Basic => basic::properties(),
            Self::Foveated => foveated::properties(),
            Self::Foveated2 => foveated::properties_v2(),
            Self::Mip => mip::properties(),
            Self::Iso => iso::properties(),
            Self::Eam => eam::properties(),
            Self::Lao => lao::properties(),
            Self::Mcs => mcs::properties(),
            Self::Mcm => mcm::properties(),
            Self::Dos => dos::properties(),
            Self::Depth => depth::properties(),
        }
    }
}

impl FromStr for RendererKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A variant together with the state it keeps between frames
#[derive(Debug)]
pub enum Variant {
    Basic,
    Foveated(FoveatedState),
    Foveated2(FoveatedState),
    Mip,
    Iso,
    Eam,
    Lao,
    Mcs,
    Mcm,
    Dos(DosState),
    Depth,
}

impl Variant {
    pub fn new(kind: RendererKind, props: &Properties) -> Result<Self> {
        Ok(match kind {
            RendererKind::Basic => Self::Basic,
            RendererKind::Foveated => Self::Foveated(FoveatedState::new(props)?),
            RendererKind::Foveated2 => Self::Foveated2(FoveatedState::new(props)?),
            RendererKind::Mip => Self::Mip,
            RendererKind::Iso => Self::Iso,
            RendererKind::Eam => Self::Eam,
            RendererKind::Lao => Self::Lao,
            RendererKind::Mcs => Self::Mcs,
            RendererKind::Mcm => Self::Mcm,
            RendererKind::Dos => Self::Dos(DosState::default()),
            RendererKind::Depth => Self::Depth,
        })
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            Self::Basic => RendererKind::Basic,
            Self::Foveated(_) => RendererKind::Foveated,
            Self::Foveated2(_) => RendererKind::Foveated2,
            Self::Mip => RendererKind::Mip,
            Self::Iso => RendererKind::Iso,
            Self::Eam => RendererKind::Eam,
            Self::Lao => RendererKind::Lao,
            Self::Mcs => RendererKind::Mcs,
            Self::Mcm => RendererKind::Mcm,
            Self::Dos(_) => RendererKind::Dos,
            Self::Depth => RendererKind::Depth,
        }
    }

    /// Recompute CPU-side derived state from the current properties
    pub fn rebuild_derived(&mut self, props: &Properties) -> Result<()> {
        match self {
            Self::Foveated(state) | Self::Foveated2(state) => state.rebuild(props),
            Self::Dos(state) => {
                state.restart();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn generate(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        match self {
            Self::Foveated(_) => foveated::generate(ctx),
            Self::Mip => mip::generate(ctx),
            Self::Iso => iso::generate(ctx),
            Self::Eam => eam::generate(ctx),
            Self::Lao => lao::generate(ctx),
            Self::Depth => depth::generate(ctx),
            other => Err(Error::Gpu(format!(
                "renderer '{}' has no generate stage",
                other.kind()
            ))),
        }
    }

    pub fn integrate(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        match self {
            Self::Basic => basic::integrate(ctx),
            Self::Foveated(state) => foveated::integrate(state, ctx),
            Self::Foveated2(state) => foveated::integrate_v2(state, ctx),
            Self::Mip => mip::integrate(ctx),
            Self::Iso => iso::integrate(ctx),
            Self::Eam => eam::integrate(ctx),
            Self::Lao => lao::integrate(ctx),
            Self::Mcs => mcs::integrate(ctx),
            Self::Mcm => mcm::integrate(ctx),
            Self::Dos(state) => dos::integrate(state, ctx),
            Self::Depth => depth::integrate(ctx),
        }
    }

    pub fn render(&self, ctx: &mut StageContext<'_>) -> Result<()> {
        match self {
            Self::Basic => basic::render(ctx),
            Self::Foveated(_) => foveated::render(ctx),
            Self::Foveated2(_) => foveated::render_v2(ctx),
            Self::Mip => mip::render(ctx),
            Self::Iso => iso::render(ctx),
            Self::Eam => eam::render(ctx),
            Self::Lao => lao::render(ctx),
            Self::Mcs => mcs::render(ctx),
            Self::Mcm => mcm::render(ctx),
            Self::Dos(_) => dos::render(ctx),
            Self::Depth => depth::render(ctx),
        }
    }

    /// Write initial accumulation state into the bound WRITE side
    pub fn reset(&mut self, ctx: &mut StageContext<'_>) -> Result<()> {
        match self {
            Self::Basic => basic::reset(ctx),
            Self::Foveated(_) | Self::Foveated2(_) => foveated::reset(ctx),
            Self::Mcm => mcm::reset(ctx),
            Self::Dos(state) => {
                state.restart();
                clear(ctx)
            }
            _ => clear(ctx),
        }
    }
}

/// Reset pass for variants whose initial accumulation state is all zeros
fn clear(ctx: &mut StageContext<'_>) -> Result<()> {
    let buffers = ctx.targets.accumulation.write_attachments().len() as u32;
    ctx.use_program(Stage::Reset)?;
    ctx.draw(
        crate::render::backend::Primitive::Triangles,
        FULLSCREEN_VERTICES,
        buffers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_round_trips_every_kind() {
        for kind in RendererKind::ALL {
            assert_eq!(RendererKind::from_name(kind.name()).unwrap(), kind);
            assert_eq!(kind.to_string().parse::<RendererKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_name_is_configuration_error() {
        let err = RendererKind::from_name("pathtracer").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("pathtracer"));
    }

    #[test]
    fn test_every_kind_declares_mandatory_stages() {
        for kind in RendererKind::ALL {
            let caps = kind.capabilities();
            for stage in [Stage::Integrate, Stage::Render, Stage::Reset] {
                assert!(caps.has_stage(stage), "{} lacks {}", kind, stage);
            }
            assert_eq!(caps.has_stage(Stage::Generate), caps.generate.is_some(), "{}", kind);
        }
    }

    #[test]
    fn test_display_groups_are_rgba() {
        for kind in RendererKind::ALL {
            let render = kind.capabilities().render;
            assert_eq!(render.formats.len(), 1, "{}", kind);
            assert_eq!(render.formats[0].channels(), 4, "{}", kind);
        }
    }

    #[test]
    fn test_property_names_are_unique() {
        for kind in RendererKind::ALL {
            let props = kind.properties();
            let mut names: Vec<_> = props.iter().map(|p| p.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), props.len(), "{}", kind);
        }
    }

    #[test]
    fn test_variant_kind_matches() {
        for kind in RendererKind::ALL {
            let props = Properties::new(kind.properties());
            let variant = Variant::new(kind, &props).unwrap();
            assert_eq!(variant.kind(), kind);
        }
    }
}
