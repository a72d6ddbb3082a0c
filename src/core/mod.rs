//! Core renderer types and utilities

pub mod types;
pub mod error;
pub mod logging;
pub mod rng;
pub mod camera;
pub mod config;

pub use types::*;
pub use error::Error;
