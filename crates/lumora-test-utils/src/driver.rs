//! Trait abstracting the graphics driver for testing.
//!
//! The `GpuDriver` trait is the only way the bridge talks to a GPU. The real implementation
//! wraps wgpu; `MockGpuDriver` records calls and injects failures.

use std::ops::Range;
use std::sync::Arc;

use crate::gpu_types::*;

/// Opaque identifier of a host-owned window.
///
/// The bridge never owns the window behind this id; it looks the id up in a registry and
/// checks liveness before every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostWindowId(pub u64);

impl std::fmt::Display for HostWindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A window the driver may create a surface for.
///
/// `target` carries the raw window/display handles for real drivers. Headless hosts (and the
/// mock driver) register windows without one.
#[derive(Clone)]
pub struct SurfaceSource {
    pub window: HostWindowId,
    pub target: Option<Arc<dyn wgpu::WindowHandle>>,
}

impl std::fmt::Debug for SurfaceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSource")
            .field("window", &self.window)
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

/// Driver-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// No adapter compatible with the request exists
    NoAdapter,
    /// The device was lost (driver reset, GPU removed, ...)
    DeviceLost,
    /// A GPU allocation failed
    OutOfMemory,
    /// The surface must be re-created
    SurfaceLost,
    /// The surface configuration no longer matches the window
    SurfaceOutdated,
    /// Acquiring the next image timed out
    Timeout,
    /// The host window has no usable handle, or is gone
    WindowUnavailable,
    /// The requested configuration is not supported
    Unsupported(String),
    /// A handle of the wrong kind was passed (e.g. a mock handle to the wgpu driver)
    ForeignHandle,
    Other(String),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "No compatible GPU adapter"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::OutOfMemory => write!(f, "GPU out of memory"),
            Self::SurfaceLost => write!(f, "Surface lost"),
            Self::SurfaceOutdated => write!(f, "Surface outdated"),
            Self::Timeout => write!(f, "Timed out acquiring surface image"),
            Self::WindowUnavailable => write!(f, "Host window unavailable"),
            Self::Unsupported(msg) => write!(f, "Unsupported configuration: {}", msg),
            Self::ForeignHandle => write!(f, "Handle does not belong to this driver"),
            Self::Other(msg) => write!(f, "Driver error: {}", msg),
        }
    }
}

impl std::error::Error for DriverError {}

/// Parameters for device creation.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub required_features: wgpu::Features,
    pub limits: wgpu::Limits,
    pub label: Option<&'static str>,
}

impl Default for DeviceRequest {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            limits: wgpu::Limits::default(),
            label: Some("lumora-device"),
        }
    }
}

impl DeviceRequest {
    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    pub fn limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// What the adapter behind a device can present.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterCapabilities {
    pub adapter_name: String,
    /// Render-attachment capable surface formats, most preferred first.
    pub formats: Vec<wgpu::TextureFormat>,
    pub present_modes: Vec<wgpu::PresentMode>,
    pub max_texture_dimension: u32,
}

impl AdapterCapabilities {
    pub fn supports_format(&self, format: wgpu::TextureFormat) -> bool {
        self.formats.contains(&format)
    }

    /// `Auto*` modes always resolve to something the surface supports.
    pub fn supports_present_mode(&self, mode: wgpu::PresentMode) -> bool {
        matches!(
            mode,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        ) || self.present_modes.contains(&mode)
    }

    /// First sRGB format, else the first format.
    pub fn preferred_format(&self) -> Option<wgpu::TextureFormat> {
        self.formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| self.formats.first().copied())
    }
}

/// A freshly created device together with what it supports.
#[derive(Debug)]
pub struct DeviceBundle {
    pub device: GpuDevice,
    pub capabilities: AdapterCapabilities,
}

/// Swapchain configuration derived from a surface descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfig {
    pub width: u32,
    pub height: u32,
    /// `None` lets the driver pick the surface's preferred format. The chosen format is
    /// reported by [`GpuSwapchain::format`].
    pub format: Option<wgpu::TextureFormat>,
    pub present_mode: wgpu::PresentMode,
    pub max_frame_latency: u32,
}

/// Built-in pipeline description.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub shader_source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub target_format: wgpu::TextureFormat,
}

/// A single non-indexed draw.
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub pipeline: &'a GpuPipeline,
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// One render pass into a presentable frame.
#[derive(Debug, Clone)]
pub struct PassDesc<'a> {
    pub label: &'a str,
    /// `None` loads the previous contents.
    pub clear: Option<wgpu::Color>,
    pub draws: &'a [DrawCall<'a>],
}

/// Trait abstracting the device, queue and swapchain provider.
///
/// # Ownership
///
/// All handles are owned wrappers, so no lifetimes leak into the bridge. The trait is object
/// safe and `Send`: the render thread owns a `Box<dyn GpuDriver>` exclusively.
///
/// Every `release_*` method consumes its handle; callers must release what they create.
pub trait GpuDriver: Send {
    /// Create the process GPU context. Never given a surface; devices outlive windows.
    fn request_device(&mut self, request: &DeviceRequest) -> Result<DeviceBundle, DriverError>;

    fn release_device(&mut self, device: GpuDevice);

    /// Returns `DeviceLost` once the driver has signalled loss of `device`.
    fn poll_device(&mut self, device: &GpuDevice) -> Result<(), DriverError>;

    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        source: &SurfaceSource,
        config: &SwapchainConfig,
    ) -> Result<GpuSwapchain, DriverError>;

    /// Reconfigure an existing swapchain in place.
    fn configure_swapchain(
        &mut self,
        device: &GpuDevice,
        swapchain: &mut GpuSwapchain,
        config: &SwapchainConfig,
    ) -> Result<(), DriverError>;

    fn release_swapchain(&mut self, swapchain: GpuSwapchain);

    fn create_pipeline(
        &mut self,
        device: &GpuDevice,
        desc: &PipelineDesc<'_>,
    ) -> Result<GpuPipeline, DriverError>;

    fn release_pipeline(&mut self, pipeline: GpuPipeline);

    fn acquire_frame(
        &mut self,
        device: &GpuDevice,
        swapchain: &GpuSwapchain,
    ) -> Result<GpuFrame, DriverError>;

    fn encode(
        &mut self,
        device: &GpuDevice,
        frame: &GpuFrame,
        pass: &PassDesc<'_>,
    ) -> Result<GpuCommands, DriverError>;

    fn submit(&mut self, device: &GpuDevice, commands: GpuCommands) -> Result<(), DriverError>;

    fn present(&mut self, frame: GpuFrame) -> Result<(), DriverError>;
}
