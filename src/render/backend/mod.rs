//! GPU backend seam
//!
//! The pipeline core talks to the GPU only through [`GpuBackend`]: surface,
//! framebuffer and program lifetimes, draws, and the rare blocking readback.
//! [`WgpuBackend`] drives a real device; [`CountingBackend`] is headless and
//! counts every allocation so tests can check that nothing leaks.

pub mod counting;
pub mod wgpu_backend;

pub use counting::{CountingBackend, DrawRecord, ResourceCounts};
pub use wgpu_backend::WgpuBackend;

use glam::Mat4;

use crate::core::types::Result;
use crate::render::program::ProgramSource;
use crate::render::target::AttachmentSpec;

/// Handle to a 2D (or externally imported 3D) surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

/// Handle to a framebuffer binding a set of surfaces as color outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Handle to a compiled program
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Index of a uniform slot within a program, resolved at build time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Pixel rectangle a draw rasterizes into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Primitive topology of a draw
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Fullscreen passes draw one oversized triangle
    Triangles,
    /// Sample-grid passes draw one point per sample
    Points,
}

/// Value assigned to a uniform slot
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Uint(u32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Mat4(Mat4),
    Vec4Array(Vec<[f32; 4]>),
}

/// One fully specified draw, assembled from the current bindings
#[derive(Clone, Copy, Debug)]
pub struct DrawCall<'a> {
    pub program: ProgramId,
    pub framebuffer: FramebufferId,
    pub viewport: Viewport,
    /// Surface bound to each texture unit, indexed by unit
    pub textures: &'a [SurfaceId],
    pub uniforms: &'a [(UniformLocation, UniformValue)],
    /// Number of framebuffer attachments the draw writes, starting at 0
    pub draw_buffers: u32,
    pub primitive: Primitive,
    pub vertex_count: u32,
}

/// Operations the pipeline needs from a graphics device
///
/// Commands are assumed to execute in submission order on a single queue.
pub trait GpuBackend {
    /// Allocate a surface, uploading seed data when the spec carries some
    fn create_surface(&mut self, label: &str, spec: &AttachmentSpec) -> Result<SurfaceId>;

    /// Upload new contents into an existing surface
    fn write_surface(&mut self, surface: SurfaceId, spec: &AttachmentSpec) -> Result<()>;

    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Bind `attachments` as color outputs 0..N of a new framebuffer
    fn create_framebuffer(&mut self, label: &str, attachments: &[SurfaceId]) -> Result<FramebufferId>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    fn create_program(&mut self, label: &str, source: &ProgramSource) -> Result<ProgramId>;

    fn destroy_program(&mut self, program: ProgramId);

    /// Submit one draw
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Blocking readback of the first color surface of `framebuffer` as RGBA floats
    ///
    /// Drains the queue. Never call on the per-frame path.
    fn read_pixels(&mut self, framebuffer: FramebufferId, viewport: Viewport) -> Result<Vec<f32>>;
}
