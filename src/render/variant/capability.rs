//! Static capability descriptors
//!
//! A descriptor tells the driver everything it needs to allocate targets and
//! validate programs for a variant without looking at the kernels: which
//! stages run, the surfaces each stage writes, their formats and extents, and
//! the uniform slots each stage program must expose.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::render::target::{AttachmentSpec, Filter, PixelFormat};

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Generate,
    Integrate,
    Render,
    Reset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generate => "generate",
            Self::Integrate => "integrate",
            Self::Render => "render",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Resolution rule for a surface group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extent {
    /// Square surfaces at the display resolution
    Display,
    /// Fixed square grid, independent of the viewport
    Fixed(u32),
}

impl Extent {
    pub fn resolve(self, display: u32) -> u32 {
        match self {
            Self::Display => display,
            Self::Fixed(size) => size,
        }
    }
}

/// Surfaces one stage writes in a single draw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceGroup {
    pub extent: Extent,
    pub filter: Filter,
    pub formats: &'static [PixelFormat],
}

impl SurfaceGroup {
    pub const fn new(extent: Extent, formats: &'static [PixelFormat]) -> Self {
        Self {
            extent,
            filter: Filter::Nearest,
            formats,
        }
    }

    pub const fn linear(mut self) -> Self {
        self.filter = Filter::Linear;
        self
    }

    /// Attachment specs for this group at the given display resolution
    pub fn specs(&self, display: u32) -> Vec<AttachmentSpec> {
        let size = self.extent.resolve(display);
        self.formats
            .iter()
            .map(|format| AttachmentSpec::new(size, size, *format).with_filter(self.filter, self.filter))
            .collect()
    }

    /// Number of attachments every draw into this group writes
    pub fn count(&self) -> u32 {
        self.formats.len() as u32
    }
}

/// Uniform slots a stage program must expose
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageRequirement {
    pub stage: Stage,
    pub uniforms: &'static [&'static str],
}

/// When the generate stage runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerateSchedule {
    /// Helper surfaces depend only on parameters; regenerate on reset
    OnReset,
    /// Helper surfaces carry per-frame jitter; regenerate before each integrate
    EveryFrame,
}

/// Everything the driver needs to know about a variant up front
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub generate: Option<(SurfaceGroup, GenerateSchedule)>,
    pub accumulation: SurfaceGroup,
    pub render: SurfaceGroup,
    pub stages: &'static [StageRequirement],
}

impl Capabilities {
    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages.iter().any(|s| s.stage == stage)
    }

    /// Surfaces allocated at the given display resolution: generate, both
    /// accumulation sides, and render
    pub fn surface_count(&self) -> usize {
        let generate = self.generate.map_or(0, |(g, _)| g.formats.len());
        generate + 2 * self.accumulation.formats.len() + self.render.formats.len()
    }

    /// Framebuffers allocated: one per frame target
    pub fn framebuffer_count(&self) -> usize {
        self.generate.map_or(0, |_| 1) + 2 + 1
    }
}
