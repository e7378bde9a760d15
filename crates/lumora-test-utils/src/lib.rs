//! GPU driver abstraction and test doubles for Lumora.
//!
//! The render thread never calls wgpu directly. It goes through [`GpuDriver`], which has a
//! real wgpu-backed implementation in `lumora-render` and a recording mock here.
//!
//! # Overview
//!
//! - [`GpuDriver`] - Trait abstracting device, swapchain and submission operations
//! - `MockGpuDriver` - Mock implementation with fault injection (requires `mock` feature)
//! - GPU wrapper types (`GpuDevice`, `GpuSwapchain`, `GpuFrame`, ...) - Can be real or mock
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use lumora_test_utils::{DeviceRequest, GpuDriver, MockGpuDriver};
//!
//! let mock = MockGpuDriver::new();
//! let mut driver = mock.clone();
//!
//! let bundle = driver.request_device(&DeviceRequest::default()).unwrap();
//! assert_eq!(mock.count_device_creates(), 1);
//! assert!(bundle.device.mock_id().is_some());
//! # }
//! ```
//!
//! # Design Philosophy
//!
//! ## 1. No Lifetimes
//!
//! All handles are owned wrappers. wgpu objects are reference counted internally, so nothing
//! borrowed from the driver leaks into bridge state.
//!
//! ## 2. Explicit Release
//!
//! Every handle a driver creates is handed back through a `release_*` call. The mock checks
//! this and reports double releases and leaks as violations.

pub mod driver;
pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_driver;

pub use driver::*;
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_driver::*;
