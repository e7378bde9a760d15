//! Lumora - a native rendering bridge
//!
//! Lumora runs a GPU render loop on its own thread and lets a host (a mobile activity, a
//! desktop event loop, a test) drive it purely through lifecycle callbacks:
//!
//! - **Device Context**: one GPU device per bridge, created lazily and replaced after loss
//! - **Surface Binding**: a swapchain per host window, rebound on resize, invalidated on destroy
//! - **Frame Scheduler**: `Idle -> Running <-> Paused -> Stopped`
//! - **Render Core**: records a [`Scene`](render::Scene) and encodes it for one frame
//! - **Bridge Facade**: the host-facing [`Bridge`] and its [`HostCallbacks`]
//!
//! # Quick Start
//!
//! ```no_run
//! use lumora::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     lumora::core::logging::init();
//!
//!     let builder = BridgeBuilder::new(WgpuDriver::new())
//!         .config(Config::default().with_frame_statistics(true))
//!         .scene(ClearScene::default().with_triangle(true));
//!
//!     lumora::winit::run(builder, WindowDescriptor::default().with_title("Lumora"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Testing without a GPU
//!
//! With the `mock` feature, `MockGpuDriver` can stand in for [`WgpuDriver`](render::WgpuDriver)
//! and a [`RenderWorker`] can be driven one tick at a time from [`BridgeBuilder::build`].

pub use lumora_bridge as bridge;
pub use lumora_core as core;
pub use lumora_render as render;
pub use lumora_test_utils as driver;
#[cfg(feature = "winit")]
pub use lumora_winit as winit;

pub use lumora_bridge::{
    Bridge, BridgeBuilder, BridgeError, BridgeStatus, ErrorKind, HostCallbacks, LifecycleEvent,
    RenderWorker, SchedulerState, Session, TickOutcome,
};
pub use lumora_core::{Config, InputEvent, PhysicalSize};
pub use lumora_render::{HostWindowId, SurfaceDescriptor, WindowRegistry, wgpu};

/// Prelude module for convenient imports
pub mod prelude {
    pub use lumora_bridge::{
        Bridge, BridgeBuilder, BridgeStatus, ErrorKind, HostCallbacks, SchedulerState,
    };
    pub use lumora_core::config::{Config, FramePacing, ProfilingMode, RecoveryPolicy};
    pub use lumora_core::input::{InputEvent, InputState, Key, NamedKey, PointerButton};
    pub use lumora_core::PhysicalSize;
    pub use lumora_render::{
        ClearScene, DeviceRequest, DrawList, FrameState, HostWindowId, PipelineKind, Scene,
        SurfaceDescriptor, WgpuDriver, wgpu,
    };
    #[cfg(feature = "winit")]
    pub use lumora_winit::{BridgeApp, WindowDescriptor};
}
