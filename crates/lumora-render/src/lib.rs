//! Device, surface binding and render core for the Lumora bridge.
//!
//! Everything here runs on the render thread and talks to the GPU only through
//! [`GpuDriver`](lumora_test_utils::GpuDriver):
//!
//! - [`DeviceSlot`] holds the one live [`DeviceContext`] and replaces it after device loss.
//! - [`SurfaceBinding`] owns the swapchain for one host window, tracked by [`WindowRegistry`].
//! - [`RenderCore`] records a [`Scene`] into a [`PresentableTarget`].
//! - [`WgpuDriver`] is the production driver.

pub mod device;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod render_core;
pub mod scene;
pub mod surface;
pub mod wgpu_driver;
pub mod window;

pub use device::{DeviceContext, DeviceSlot};
pub use error::{ErrorKind, RenderError};
pub use frame::{FrameState, FrameStats};
pub use pipeline::PipelineKind;
pub use render_core::{DrawResult, RenderCore, RenderCoreState};
pub use scene::{ClearScene, DrawCommand, DrawList, Scene};
pub use surface::{
    BindingId, BindingStatus, PresentableTarget, RebindOutcome, SurfaceBinding,
    SurfaceDescriptor,
};
pub use wgpu_driver::WgpuDriver;
pub use window::{PrePresentHook, WindowRegistry};

pub use lumora_test_utils::{DeviceRequest, GpuDriver, HostWindowId};
pub use wgpu;
