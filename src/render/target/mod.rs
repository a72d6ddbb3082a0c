//! Render targets: attachment specs, frame targets and ping-pong pairs

pub mod attachment;
pub mod frame_target;
pub mod ping_pong;

pub use attachment::{AttachmentSpec, Filter, PixelFormat, ScalarType, SurfaceData, Wrap};
pub use frame_target::FrameTarget;
pub use ping_pong::PingPongTarget;
