//! Voltrace - progressive GPU volumetric renderer core
//!
//! Renderer variants share one staged frame pipeline (generate, integrate,
//! render) over ping-pong accumulation targets. Devices are reached through
//! the [`render::backend::GpuBackend`] seam.

pub mod core;
pub mod render;
pub mod sampling;
