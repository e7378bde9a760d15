//! Lumora Core
//!
//! Shared building blocks for the Lumora rendering bridge: logging setup, profiling hooks,
//! bridge configuration, pixel geometry and the host input event model.

pub mod config;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod profiling;

pub use config::Config;
pub use geometry::PhysicalSize;
pub use input::{InputEvent, InputState};
