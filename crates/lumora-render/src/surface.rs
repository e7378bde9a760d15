use std::sync::atomic::{AtomicU64, Ordering};

use lumora_core::PhysicalSize;
use lumora_core::profiling::profile_function;
use lumora_test_utils::{
    DriverError, GpuDriver, GpuFrame, GpuSwapchain, HostWindowId, SwapchainConfig,
};

use crate::device::DeviceContext;
use crate::error::RenderError;
use crate::window::WindowRegistry;

/// Frames the swapchain may queue ahead of presentation.
pub const DEFAULT_FRAME_LATENCY: u32 = 2;

/// Describes the host surface a binding should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub window: HostWindowId,
    pub size: PhysicalSize<u32>,
    /// `None` picks the preferred supported format.
    pub format: Option<wgpu::TextureFormat>,
    pub present_mode: wgpu::PresentMode,
    pub max_frame_latency: u32,
}

impl SurfaceDescriptor {
    pub fn new(window: HostWindowId, size: impl Into<PhysicalSize<u32>>) -> Self {
        Self {
            window,
            size: size.into(),
            format: None,
            present_mode: wgpu::PresentMode::AutoVsync,
            max_frame_latency: DEFAULT_FRAME_LATENCY,
        }
    }

    pub fn with_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_present_mode(mut self, mode: wgpu::PresentMode) -> Self {
        self.present_mode = mode;
        self
    }

    pub fn with_max_frame_latency(mut self, frames: u32) -> Self {
        self.max_frame_latency = frames.max(1);
        self
    }

    pub fn with_size(mut self, size: impl Into<PhysicalSize<u32>>) -> Self {
        self.size = size.into();
        self
    }

    fn swapchain_config(&self) -> SwapchainConfig {
        SwapchainConfig {
            width: self.size.width,
            height: self.size.height,
            format: self.format,
            present_mode: self.present_mode,
            max_frame_latency: self.max_frame_latency,
        }
    }
}

/// Stable identity of a [`SurfaceBinding`], preserved across rebinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

impl BindingId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStatus {
    Valid,
    Invalidated,
}

/// What [`SurfaceBinding::rebind`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebindOutcome {
    /// Identical descriptor on a valid binding
    Unchanged,
    /// The existing swapchain was reconfigured in place
    Reconfigured,
    /// The swapchain was released and created again
    Recreated,
}

/// A swapchain image checked out for exactly one frame.
///
/// Holds the binding's epoch at acquisition time. Presenting after the binding was rebound or
/// invalidated is rejected.
#[derive(Debug)]
pub struct PresentableTarget {
    binding: BindingId,
    epoch: u64,
    frame: GpuFrame,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
}

impl PresentableTarget {
    pub fn binding(&self) -> BindingId {
        self.binding
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn frame(&self) -> &GpuFrame {
        &self.frame
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// A bridge-owned swapchain for one host window.
///
/// The window itself stays host-owned; the binding only holds its id and checks the
/// [`WindowRegistry`] before every use.
#[derive(Debug)]
pub struct SurfaceBinding {
    id: BindingId,
    epoch: u64,
    status: BindingStatus,
    descriptor: SurfaceDescriptor,
    swapchain: Option<GpuSwapchain>,
    device_generation: u64,
}

impl SurfaceBinding {
    /// Create a swapchain for `descriptor`.
    pub fn bind(
        descriptor: SurfaceDescriptor,
        device: &DeviceContext,
        driver: &mut dyn GpuDriver,
        windows: &WindowRegistry,
    ) -> Result<Self, RenderError> {
        profile_function!();

        let swapchain = create_swapchain(&descriptor, device, driver, windows)?;
        let binding = Self {
            id: BindingId::next(),
            epoch: 0,
            status: BindingStatus::Valid,
            descriptor,
            swapchain: Some(swapchain),
            device_generation: device.generation(),
        };
        tracing::info!(
            "Bound surface {:?} to {} at {} ({:?})",
            binding.id,
            descriptor.window,
            descriptor.size,
            binding.format()
        );
        Ok(binding)
    }

    /// Point the binding at `descriptor`, keeping its id.
    ///
    /// An identical descriptor on a valid binding is a no-op. A size, format or mode change on
    /// the same window reconfigures in place. A different window, a new device generation or an
    /// invalidated binding re-creates the swapchain. Any change bumps the epoch. On failure the
    /// binding is left invalidated with no swapchain.
    pub fn rebind(
        &mut self,
        descriptor: SurfaceDescriptor,
        device: &DeviceContext,
        driver: &mut dyn GpuDriver,
        windows: &WindowRegistry,
    ) -> Result<RebindOutcome, RenderError> {
        profile_function!();

        let same_device = self.device_generation == device.generation();
        if self.status == BindingStatus::Valid
            && same_device
            && descriptor == self.descriptor
            && windows.is_alive(descriptor.window)
        {
            return Ok(RebindOutcome::Unchanged);
        }

        if let Err(e) = validate(&descriptor, device, windows) {
            self.invalidate(driver);
            return Err(e);
        }

        let can_reconfigure = self.status == BindingStatus::Valid
            && same_device
            && descriptor.window == self.descriptor.window;

        if can_reconfigure && let Some(swapchain) = self.swapchain.as_mut() {
            match driver.configure_swapchain(
                device.device(),
                swapchain,
                &descriptor.swapchain_config(),
            ) {
                Ok(()) => {
                    self.descriptor = descriptor;
                    self.epoch += 1;
                    tracing::debug!(
                        "Reconfigured surface {:?} to {} (epoch {})",
                        self.id,
                        descriptor.size,
                        self.epoch
                    );
                    return Ok(RebindOutcome::Reconfigured);
                }
                Err(DriverError::DeviceLost) => {
                    self.invalidate(driver);
                    return Err(RenderError::DeviceLost);
                }
                Err(e) => {
                    tracing::warn!("Reconfigure of {:?} failed ({}), re-creating", self.id, e);
                }
            }
        }

        self.release_swapchain(driver);
        match create_swapchain(&descriptor, device, driver, windows) {
            Ok(swapchain) => {
                self.swapchain = Some(swapchain);
                self.descriptor = descriptor;
                self.device_generation = device.generation();
                self.status = BindingStatus::Valid;
                self.epoch += 1;
                tracing::info!(
                    "Re-created surface {:?} for {} at {} (epoch {})",
                    self.id,
                    descriptor.window,
                    descriptor.size,
                    self.epoch
                );
                Ok(RebindOutcome::Recreated)
            }
            Err(e) => {
                self.mark_invalid();
                Err(e)
            }
        }
    }

    /// Mark the binding unusable and release its swapchain.
    ///
    /// Never touches the host window. Idempotent.
    pub fn invalidate(&mut self, driver: &mut dyn GpuDriver) {
        if self.status == BindingStatus::Valid {
            tracing::debug!("Invalidated surface {:?}", self.id);
        }
        self.release_swapchain(driver);
        self.mark_invalid();
    }

    /// Check out the next swapchain image.
    pub fn acquire(
        &mut self,
        device: &DeviceContext,
        driver: &mut dyn GpuDriver,
        windows: &WindowRegistry,
    ) -> Result<PresentableTarget, RenderError> {
        profile_function!();

        if self.status == BindingStatus::Invalidated {
            return Err(RenderError::SurfaceInvalid);
        }
        if !windows.is_alive(self.descriptor.window) {
            tracing::debug!(
                "Host {} is gone, invalidating surface {:?}",
                self.descriptor.window,
                self.id
            );
            self.invalidate(driver);
            return Err(RenderError::SurfaceInvalid);
        }
        if self.device_generation != device.generation() {
            return Err(RenderError::SurfaceInvalid);
        }
        let swapchain = self.swapchain.as_ref().ok_or(RenderError::SurfaceInvalid)?;

        let frame = driver
            .acquire_frame(device.device(), swapchain)
            .map_err(frame_error)?;
        let (width, height) = frame.size();

        Ok(PresentableTarget {
            binding: self.id,
            epoch: self.epoch,
            frame,
            size: PhysicalSize::new(width, height),
            format: swapchain.format(),
        })
    }

    /// Present a target acquired from this binding.
    pub fn present(
        &mut self,
        target: PresentableTarget,
        driver: &mut dyn GpuDriver,
        windows: &WindowRegistry,
    ) -> Result<(), RenderError> {
        profile_function!();

        if target.binding != self.id
            || target.epoch != self.epoch
            || self.status == BindingStatus::Invalidated
        {
            tracing::debug!(
                "Dropping stale frame for {:?} (epoch {} != {})",
                target.binding,
                target.epoch,
                self.epoch
            );
            return Err(RenderError::SurfaceInvalid);
        }
        if !windows.is_alive(self.descriptor.window) {
            drop(target);
            self.invalidate(driver);
            return Err(RenderError::SurfaceInvalid);
        }

        windows.notify_pre_present(self.descriptor.window);
        driver.present(target.frame).map_err(frame_error)
    }

    /// Release the swapchain for good.
    pub fn release(mut self, driver: &mut dyn GpuDriver) {
        self.release_swapchain(driver);
        self.mark_invalid();
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self) -> BindingStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == BindingStatus::Valid
    }

    pub fn descriptor(&self) -> &SurfaceDescriptor {
        &self.descriptor
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.descriptor.size
    }

    /// Format the swapchain was configured with.
    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.swapchain.as_ref().map(GpuSwapchain::format)
    }

    pub fn device_generation(&self) -> u64 {
        self.device_generation
    }

    fn mark_invalid(&mut self) {
        if self.status == BindingStatus::Valid {
            self.epoch += 1;
        }
        self.status = BindingStatus::Invalidated;
    }

    fn release_swapchain(&mut self, driver: &mut dyn GpuDriver) {
        if let Some(swapchain) = self.swapchain.take() {
            driver.release_swapchain(swapchain);
        }
    }
}

fn validate(
    descriptor: &SurfaceDescriptor,
    device: &DeviceContext,
    windows: &WindowRegistry,
) -> Result<(), RenderError> {
    if descriptor.size.is_empty() {
        return Err(RenderError::SurfaceCreationFailed(format!(
            "zero-sized surface {}",
            descriptor.size
        )));
    }
    if !windows.is_alive(descriptor.window) {
        return Err(RenderError::SurfaceCreationFailed(format!(
            "{} is not alive",
            descriptor.window
        )));
    }

    let caps = device.capabilities();
    let max = caps.max_texture_dimension;
    if descriptor.size.width > max || descriptor.size.height > max {
        return Err(RenderError::SurfaceCreationFailed(format!(
            "{} exceeds maximum texture dimension {}",
            descriptor.size, max
        )));
    }
    if let Some(format) = descriptor.format
        && !caps.supports_format(format)
    {
        return Err(RenderError::SurfaceCreationFailed(format!(
            "format {:?} is not supported",
            format
        )));
    }
    if !caps.supports_present_mode(descriptor.present_mode) {
        return Err(RenderError::SurfaceCreationFailed(format!(
            "present mode {:?} is not supported",
            descriptor.present_mode
        )));
    }
    Ok(())
}

fn create_swapchain(
    descriptor: &SurfaceDescriptor,
    device: &DeviceContext,
    driver: &mut dyn GpuDriver,
    windows: &WindowRegistry,
) -> Result<GpuSwapchain, RenderError> {
    validate(descriptor, device, windows)?;
    let source = windows.source(descriptor.window).ok_or_else(|| {
        RenderError::SurfaceCreationFailed(format!("{} is not alive", descriptor.window))
    })?;

    driver
        .create_swapchain(device.device(), &source, &descriptor.swapchain_config())
        .map_err(|e| match e {
            DriverError::DeviceLost => RenderError::DeviceLost,
            other => RenderError::SurfaceCreationFailed(other.to_string()),
        })
}

fn frame_error(error: DriverError) -> RenderError {
    match error {
        DriverError::Unsupported(_) | DriverError::ForeignHandle | DriverError::Other(_) => {
            RenderError::SurfaceOutdated
        }
        other => RenderError::from(other),
    }
}
