//! Host-facing bridge for Lumora.
//!
//! A [`Bridge`] is the only thing a host (an Android activity, a winit event loop, a test)
//! talks to. It turns host callbacks into [`LifecycleEvent`]s on a channel and input into a
//! bounded [`InputQueue`]. The [`RenderWorker`] on the render thread drains both at tick
//! boundaries and owns every GPU object.
//!
//! ```text
//! host thread                      render thread
//! -----------                      -------------
//! on_surface_created ──channel──▶  DeviceSlot::acquire, SurfaceBinding::bind, start
//! on_input_event     ──queue────▶  drained at tick start
//! on_destroy         ──channel──▶  stop, release, exit ◀── join
//! ```

pub mod callbacks;
pub mod error;
pub mod facade;
pub mod input;
pub mod lifecycle;
pub mod pacing;
pub mod scheduler;
pub mod session;
pub mod status;
pub mod worker;

pub use callbacks::HostCallbacks;
pub use error::{BridgeError, ErrorKind, SchedulerError};
pub use facade::{Bridge, BridgeBuilder};
pub use input::{DrainedInput, InputQueue};
pub use lifecycle::LifecycleEvent;
pub use pacing::FramePacer;
pub use scheduler::{FrameScheduler, SchedulerAction, SchedulerState};
pub use session::Session;
pub use status::BridgeStatus;
pub use worker::{RenderWorker, TickOutcome};
