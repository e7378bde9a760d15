//! Mock implementation of GpuDriver for testing.
//!
//! The mock never touches a GPU. It hands out id-backed handles, records every successful
//! operation, and can be told to fail specific operations or to lose its device.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::driver::*;
use crate::gpu_types::*;

/// Records a driver operation for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    RequestDevice {
        device: usize,
    },
    ReleaseDevice {
        device: usize,
    },
    CreateSwapchain {
        swapchain: usize,
        window: HostWindowId,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        present_mode: wgpu::PresentMode,
    },
    ConfigureSwapchain {
        swapchain: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        present_mode: wgpu::PresentMode,
    },
    ReleaseSwapchain {
        swapchain: usize,
    },
    CreatePipeline {
        pipeline: usize,
        label: String,
        format: wgpu::TextureFormat,
    },
    ReleasePipeline {
        pipeline: usize,
    },
    AcquireFrame {
        swapchain: usize,
        frame: usize,
    },
    Encode {
        frame: usize,
        cleared: bool,
        draw_calls: usize,
    },
    Submit {
        draw_calls: usize,
    },
    Present {
        swapchain: usize,
        frame: usize,
    },
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    RequestDevice,
    PollDevice,
    CreateSwapchain,
    ConfigureSwapchain,
    CreatePipeline,
    AcquireFrame,
    Encode,
    Submit,
    Present,
}

#[derive(Debug)]
struct MockDevice {
    lost: bool,
}

#[derive(Debug)]
struct MockSwapchain {
    device: usize,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<DriverCall>,
    attempts: AHashMap<MockOp, usize>,
    fail_next: AHashMap<MockOp, Vec<DriverError>>,
    fail_always: AHashMap<MockOp, DriverError>,
    adapter_available: bool,
    formats: Vec<wgpu::TextureFormat>,
    present_modes: Vec<wgpu::PresentMode>,
    max_texture_dimension: u32,
    devices: AHashMap<usize, MockDevice>,
    swapchains: AHashMap<usize, MockSwapchain>,
    live_pipelines: usize,
    violations: Vec<String>,
    next_id: usize,
}

impl MockState {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Counts the attempt and returns the injected failure, if any.
    fn check(&mut self, op: MockOp) -> Result<(), DriverError> {
        *self.attempts.entry(op).or_default() += 1;
        if let Some(queue) = self.fail_next.get_mut(&op)
            && !queue.is_empty()
        {
            return Err(queue.remove(0));
        }
        match self.fail_always.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn resolve_format(
        &self,
        requested: Option<wgpu::TextureFormat>,
    ) -> Result<wgpu::TextureFormat, DriverError> {
        match requested {
            Some(format) if self.formats.contains(&format) => Ok(format),
            Some(format) => Err(DriverError::Unsupported(format!("{:?}", format))),
            None => self
                .formats
                .first()
                .copied()
                .ok_or_else(|| DriverError::Unsupported("no surface formats".to_string())),
        }
    }

    fn check_device(&mut self, device: &GpuDevice) -> Result<usize, DriverError> {
        let Some(id) = device.mock_id() else {
            return Err(DriverError::ForeignHandle);
        };
        match self.devices.get(&id) {
            Some(MockDevice { lost: true }) => Err(DriverError::DeviceLost),
            Some(_) => Ok(id),
            None => {
                self.violations
                    .push(format!("device {} used after release", id));
                Err(DriverError::Other(format!("unknown device {}", id)))
            }
        }
    }

    fn check_swapchain(&mut self, swapchain: usize) -> Result<(), DriverError> {
        let Some(entry) = self.swapchains.get(&swapchain) else {
            self.violations
                .push(format!("swapchain {} used after release", swapchain));
            return Err(DriverError::SurfaceLost);
        };
        match self.devices.get(&entry.device) {
            Some(MockDevice { lost: true }) => Err(DriverError::DeviceLost),
            Some(_) => Ok(()),
            None => {
                self.violations.push(format!(
                    "swapchain {} outlived device {}",
                    swapchain, entry.device
                ));
                Err(DriverError::DeviceLost)
            }
        }
    }
}

/// Mock implementation of [`GpuDriver`].
///
/// # Borrow Checking Pattern: Shared Handle
///
/// The driver is boxed and moved onto the render thread, but tests still need to inspect it.
/// `MockGpuDriver` is a cheap `Clone` over `Arc<Mutex<..>>`: keep one clone in the test and
/// hand the other to the bridge.
///
/// # Example
///
/// ```rust
/// use lumora_test_utils::{DeviceRequest, DriverError, GpuDriver, MockGpuDriver, MockOp};
///
/// let mock = MockGpuDriver::new();
/// let mut driver: Box<dyn GpuDriver> = Box::new(mock.clone());
///
/// mock.fail_next(MockOp::RequestDevice, DriverError::NoAdapter);
/// assert!(driver.request_device(&DeviceRequest::default()).is_err());
///
/// let bundle = driver.request_device(&DeviceRequest::default()).unwrap();
/// assert_eq!(mock.live_devices(), 1);
/// driver.release_device(bundle.device);
/// assert_eq!(mock.live_devices(), 0);
/// ```
#[derive(Clone)]
pub struct MockGpuDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockGpuDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                attempts: AHashMap::new(),
                fail_next: AHashMap::new(),
                fail_always: AHashMap::new(),
                adapter_available: true,
                formats: vec![
                    wgpu::TextureFormat::Bgra8UnormSrgb,
                    wgpu::TextureFormat::Rgba8UnormSrgb,
                    wgpu::TextureFormat::Rgba8Unorm,
                ],
                present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox],
                max_texture_dimension: 8192,
                devices: AHashMap::new(),
                swapchains: AHashMap::new(),
                live_pipelines: 0,
                violations: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Mock without any adapter; `request_device` always fails with `NoAdapter`.
    pub fn without_adapter() -> Self {
        let mock = Self::new();
        mock.set_adapter_available(false);
        mock
    }

    pub fn set_adapter_available(&self, available: bool) {
        self.state.lock().adapter_available = available;
    }

    pub fn set_formats(&self, formats: Vec<wgpu::TextureFormat>) {
        self.state.lock().formats = formats;
    }

    pub fn set_present_modes(&self, modes: Vec<wgpu::PresentMode>) {
        self.state.lock().present_modes = modes;
    }

    pub fn set_max_texture_dimension(&self, dimension: u32) {
        self.state.lock().max_texture_dimension = dimension;
    }

    /// Fail the next call of `op` with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, op: MockOp, error: DriverError) {
        self.state
            .lock()
            .fail_next
            .entry(op)
            .or_default()
            .push(error);
    }

    /// Fail every call of `op` until [`clear_failures`](Self::clear_failures).
    pub fn fail_always(&self, op: MockOp, error: DriverError) {
        self.state.lock().fail_always.insert(op, error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.fail_next.clear();
        state.fail_always.clear();
    }

    /// Mark every live device as lost, as if the driver reset.
    pub fn lose_device(&self) {
        for device in self.state.lock().devices.values_mut() {
            device.lost = true;
        }
    }

    /// Get a copy of all recorded calls (for test assertions).
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of calls of `op`, including failed ones.
    pub fn attempts(&self, op: MockOp) -> usize {
        self.state.lock().attempts.get(&op).copied().unwrap_or(0)
    }

    fn count(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|&call| predicate(call)).count()
    }

    pub fn count_device_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::RequestDevice { .. }))
    }

    pub fn count_swapchain_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CreateSwapchain { .. }))
    }

    pub fn count_configures(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::ConfigureSwapchain { .. }))
    }

    pub fn count_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::CreatePipeline { .. }))
    }

    pub fn count_submits(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Submit { .. }))
    }

    pub fn count_presents(&self) -> usize {
        self.count(|call| matches!(call, DriverCall::Present { .. }))
    }

    /// Devices created and not yet released.
    pub fn live_devices(&self) -> usize {
        self.state.lock().devices.len()
    }

    pub fn live_swapchains(&self) -> usize {
        self.state.lock().swapchains.len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.state.lock().live_pipelines
    }

    /// Ownership mistakes seen so far (use after release, double release, leaks on release).
    pub fn violations(&self) -> Vec<String> {
        self.state.lock().violations.clone()
    }

    /// Size of the most recent swapchain create or configure.
    pub fn last_swapchain_size(&self) -> Option<(u32, u32)> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            DriverCall::CreateSwapchain { width, height, .. }
            | DriverCall::ConfigureSwapchain { width, height, .. } => Some((*width, *height)),
            _ => None,
        })
    }
}

impl Default for MockGpuDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockGpuDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockGpuDriver")
            .field("calls", &state.calls.len())
            .field("live_devices", &state.devices.len())
            .field("live_swapchains", &state.swapchains.len())
            .finish()
    }
}

impl GpuDriver for MockGpuDriver {
    fn request_device(&mut self, _request: &DeviceRequest) -> Result<DeviceBundle, DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::RequestDevice)?;
        if !state.adapter_available {
            return Err(DriverError::NoAdapter);
        }

        let id = state.next_id();
        state.devices.insert(id, MockDevice { lost: false });
        state.calls.push(DriverCall::RequestDevice { device: id });

        Ok(DeviceBundle {
            device: GpuDevice::mock(id),
            capabilities: AdapterCapabilities {
                adapter_name: "Mock Adapter".to_string(),
                formats: state.formats.clone(),
                present_modes: state.present_modes.clone(),
                max_texture_dimension: state.max_texture_dimension,
            },
        })
    }

    fn release_device(&mut self, device: GpuDevice) {
        let mut state = self.state.lock();
        let Some(id) = device.mock_id() else {
            state.violations.push("foreign device released".to_string());
            return;
        };
        if state.devices.remove(&id).is_none() {
            state.violations.push(format!("device {} released twice", id));
            return;
        }
        if state.swapchains.values().any(|s| s.device == id) {
            state
                .violations
                .push(format!("device {} released with live swapchains", id));
        }
        state.calls.push(DriverCall::ReleaseDevice { device: id });
    }

    fn poll_device(&mut self, device: &GpuDevice) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::PollDevice)?;
        state.check_device(device).map(|_| ())
    }

    fn create_swapchain(
        &mut self,
        device: &GpuDevice,
        source: &SurfaceSource,
        config: &SwapchainConfig,
    ) -> Result<GpuSwapchain, DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::CreateSwapchain)?;
        let device = state.check_device(device)?;
        let format = state.resolve_format(config.format)?;
        let auto = matches!(
            config.present_mode,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        );
        if !auto && !state.present_modes.contains(&config.present_mode) {
            return Err(DriverError::Unsupported(format!("{:?}", config.present_mode)));
        }

        let id = state.next_id();
        state.swapchains.insert(id, MockSwapchain { device });
        state.calls.push(DriverCall::CreateSwapchain {
            swapchain: id,
            window: source.window,
            width: config.width,
            height: config.height,
            format,
            present_mode: config.present_mode,
        });
        Ok(GpuSwapchain::mock(id, config.width, config.height, format))
    }

    fn configure_swapchain(
        &mut self,
        device: &GpuDevice,
        swapchain: &mut GpuSwapchain,
        config: &SwapchainConfig,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::ConfigureSwapchain)?;
        state.check_device(device)?;
        let id = swapchain.mock_id().ok_or(DriverError::ForeignHandle)?;
        state.check_swapchain(id)?;
        let format = state.resolve_format(config.format)?;

        swapchain.set_mock_extent(config.width, config.height, format);
        state.calls.push(DriverCall::ConfigureSwapchain {
            swapchain: id,
            width: config.width,
            height: config.height,
            format,
            present_mode: config.present_mode,
        });
        Ok(())
    }

    fn release_swapchain(&mut self, swapchain: GpuSwapchain) {
        let mut state = self.state.lock();
        let Some(id) = swapchain.mock_id() else {
            state.violations.push("foreign swapchain released".to_string());
            return;
        };
        if state.swapchains.remove(&id).is_none() {
            state
                .violations
                .push(format!("swapchain {} released twice", id));
            return;
        }
        state.calls.push(DriverCall::ReleaseSwapchain { swapchain: id });
    }

    fn create_pipeline(
        &mut self,
        device: &GpuDevice,
        desc: &PipelineDesc<'_>,
    ) -> Result<GpuPipeline, DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::CreatePipeline)?;
        state.check_device(device)?;

        let id = state.next_id();
        state.live_pipelines += 1;
        state.calls.push(DriverCall::CreatePipeline {
            pipeline: id,
            label: desc.label.to_string(),
            format: desc.target_format,
        });
        Ok(GpuPipeline::mock(id))
    }

    fn release_pipeline(&mut self, pipeline: GpuPipeline) {
        let mut state = self.state.lock();
        let Some(id) = pipeline.mock_id() else {
            state.violations.push("foreign pipeline released".to_string());
            return;
        };
        state.live_pipelines = state.live_pipelines.saturating_sub(1);
        state.calls.push(DriverCall::ReleasePipeline { pipeline: id });
    }

    fn acquire_frame(
        &mut self,
        device: &GpuDevice,
        swapchain: &GpuSwapchain,
    ) -> Result<GpuFrame, DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::AcquireFrame)?;
        state.check_device(device)?;
        let swapchain_id = swapchain.mock_id().ok_or(DriverError::ForeignHandle)?;
        state.check_swapchain(swapchain_id)?;

        let id = state.next_id();
        let (width, height) = swapchain.size();
        state.calls.push(DriverCall::AcquireFrame {
            swapchain: swapchain_id,
            frame: id,
        });
        Ok(GpuFrame::mock(id, swapchain_id, width, height))
    }

    fn encode(
        &mut self,
        device: &GpuDevice,
        frame: &GpuFrame,
        pass: &PassDesc<'_>,
    ) -> Result<GpuCommands, DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::Encode)?;
        state.check_device(device)?;
        let (frame_id, _) = frame.mock_ids().ok_or(DriverError::ForeignHandle)?;

        let id = state.next_id();
        state.calls.push(DriverCall::Encode {
            frame: frame_id,
            cleared: pass.clear.is_some(),
            draw_calls: pass.draws.len(),
        });
        Ok(GpuCommands::mock(id, pass.draws.len()))
    }

    fn submit(&mut self, device: &GpuDevice, commands: GpuCommands) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::Submit)?;
        state.check_device(device)?;
        let draw_calls = commands
            .mock_draw_calls()
            .ok_or(DriverError::ForeignHandle)?;
        state.calls.push(DriverCall::Submit { draw_calls });
        Ok(())
    }

    fn present(&mut self, frame: GpuFrame) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.check(MockOp::Present)?;
        let (frame_id, swapchain_id) = frame.mock_ids().ok_or(DriverError::ForeignHandle)?;
        state.check_swapchain(swapchain_id)?;
        state.calls.push(DriverCall::Present {
            swapchain: swapchain_id,
            frame: frame_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: u32, height: u32) -> SwapchainConfig {
        SwapchainConfig {
            width,
            height,
            format: None,
            present_mode: wgpu::PresentMode::AutoVsync,
            max_frame_latency: 2,
        }
    }

    fn source() -> SurfaceSource {
        SurfaceSource {
            window: HostWindowId(1),
            target: None,
        }
    }

    #[test]
    fn test_full_frame_records_calls() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();

        let bundle = driver.request_device(&DeviceRequest::default()).unwrap();
        let device = bundle.device;
        let swapchain = driver
            .create_swapchain(&device, &source(), &config(800, 600))
            .unwrap();
        let frame = driver.acquire_frame(&device, &swapchain).unwrap();
        assert_eq!(frame.size(), (800, 600));

        let commands = driver
            .encode(
                &device,
                &frame,
                &PassDesc {
                    label: "test",
                    clear: Some(wgpu::Color::BLACK),
                    draws: &[],
                },
            )
            .unwrap();
        driver.submit(&device, commands).unwrap();
        driver.present(frame).unwrap();

        assert_eq!(mock.count_submits(), 1);
        assert_eq!(mock.count_presents(), 1);

        driver.release_swapchain(swapchain);
        driver.release_device(device);
        assert_eq!(mock.live_devices(), 0);
        assert_eq!(mock.live_swapchains(), 0);
        assert!(mock.violations().is_empty());
    }

    #[test]
    fn test_fail_next_is_consumed_once() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        mock.fail_next(MockOp::RequestDevice, DriverError::OutOfMemory);

        assert_eq!(
            driver.request_device(&DeviceRequest::default()).unwrap_err(),
            DriverError::OutOfMemory
        );
        assert!(driver.request_device(&DeviceRequest::default()).is_ok());
        assert_eq!(mock.attempts(MockOp::RequestDevice), 2);
        assert_eq!(mock.count_device_creates(), 1);
    }

    #[test]
    fn test_fail_always_until_cleared() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let device = driver.request_device(&DeviceRequest::default()).unwrap().device;
        let swapchain = driver
            .create_swapchain(&device, &source(), &config(4, 4))
            .unwrap();

        mock.fail_always(MockOp::AcquireFrame, DriverError::SurfaceOutdated);
        for _ in 0..3 {
            assert_eq!(
                driver.acquire_frame(&device, &swapchain).unwrap_err(),
                DriverError::SurfaceOutdated
            );
        }
        mock.clear_failures();
        assert!(driver.acquire_frame(&device, &swapchain).is_ok());
    }

    #[test]
    fn test_lost_device_fails_everything() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let device = driver.request_device(&DeviceRequest::default()).unwrap().device;
        let swapchain = driver
            .create_swapchain(&device, &source(), &config(4, 4))
            .unwrap();

        mock.lose_device();
        assert_eq!(
            driver.poll_device(&device).unwrap_err(),
            DriverError::DeviceLost
        );
        assert_eq!(
            driver.acquire_frame(&device, &swapchain).unwrap_err(),
            DriverError::DeviceLost
        );

        // Releasing lost handles is still allowed
        driver.release_swapchain(swapchain);
        driver.release_device(device);
        assert!(mock.violations().is_empty());
    }

    #[test]
    fn test_configure_updates_extent() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let device = driver.request_device(&DeviceRequest::default()).unwrap().device;
        let mut swapchain = driver
            .create_swapchain(&device, &source(), &config(800, 600))
            .unwrap();

        driver
            .configure_swapchain(&device, &mut swapchain, &config(1200, 800))
            .unwrap();
        assert_eq!(swapchain.size(), (1200, 800));
        assert_eq!(mock.last_swapchain_size(), Some((1200, 800)));
        assert_eq!(mock.count_configures(), 1);
    }

    #[test]
    fn test_violations_detected() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let device = driver.request_device(&DeviceRequest::default()).unwrap().device;
        let _swapchain = driver
            .create_swapchain(&device, &source(), &config(4, 4))
            .unwrap();

        driver.release_device(device);
        assert_eq!(mock.violations().len(), 1);
    }

    #[test]
    fn test_no_adapter() {
        let mut driver = MockGpuDriver::without_adapter();
        assert_eq!(
            driver.request_device(&DeviceRequest::default()).unwrap_err(),
            DriverError::NoAdapter
        );
    }
}
