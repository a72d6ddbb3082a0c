//! Frame pipeline, renderer variants and GPU interfaces

pub mod backend;
pub mod bindings;
pub mod context;
pub mod inputs;
pub mod params;
pub mod program;
pub mod properties;
pub mod renderer;
pub mod target;
pub mod variant;

pub use inputs::{EnvironmentTexture, FrameInputs, Volume};
pub use renderer::Renderer;
pub use variant::RendererKind;
