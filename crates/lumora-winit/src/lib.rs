//! winit host for the Lumora bridge.
//!
//! [`BridgeApp`] is a winit `ApplicationHandler` that owns the host window and forwards its
//! lifecycle and input to a [`Bridge`](lumora_bridge::Bridge). Rendering happens on the
//! bridge's own thread; the event loop only ever waits for events.

pub mod app;
pub mod error;
pub mod event;
pub mod window;

pub use app::{BridgeApp, run};
#[cfg(target_os = "android")]
pub use app::run_android;
pub use error::RunError;
pub use window::{HostWindow, WindowDescriptor};
