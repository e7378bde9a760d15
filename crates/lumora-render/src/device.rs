use lumora_core::profiling::profile_function;
use lumora_test_utils::{AdapterCapabilities, DeviceRequest, DriverError, GpuDevice, GpuDriver};

use crate::error::RenderError;

/// The live GPU adapter, device and queue.
///
/// Every resource created from a device is tagged with its `generation`. A new generation
/// means every binding and cached pipeline from the previous one is stale.
#[derive(Debug)]
pub struct DeviceContext {
    device: GpuDevice,
    capabilities: AdapterCapabilities,
    generation: u64,
}

impl DeviceContext {
    pub fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Holds zero or one [`DeviceContext`].
///
/// The slot is owned by the render thread. It is the only place a device is created or
/// released.
#[derive(Debug)]
pub struct DeviceSlot {
    request: DeviceRequest,
    current: Option<DeviceContext>,
    generation: u64,
    lost: bool,
    reinitializations: u32,
}

impl DeviceSlot {
    pub fn new(request: DeviceRequest) -> Self {
        Self {
            request,
            current: None,
            generation: 0,
            lost: false,
            reinitializations: 0,
        }
    }

    /// Returns the live device, creating it on first use.
    ///
    /// Repeated calls return the same instance without touching the driver. After
    /// [`mark_lost`](Self::mark_lost) the old device is released and a new one is created under
    /// a new generation. On failure the slot is left empty.
    pub fn acquire(&mut self, driver: &mut dyn GpuDriver) -> Result<&DeviceContext, RenderError> {
        profile_function!();

        if self.lost {
            if let Some(old) = self.current.take() {
                tracing::info!(
                    "Reinitializing GPU device (generation {} lost)",
                    old.generation
                );
                driver.release_device(old.device);
                self.reinitializations += 1;
            }
            self.lost = false;
        }

        if self.current.is_none() {
            let bundle = driver.request_device(&self.request).map_err(|e| match e {
                DriverError::DeviceLost => RenderError::DeviceLost,
                DriverError::NoAdapter => RenderError::from(e),
                other => RenderError::DeviceUnavailable(other.to_string()),
            })?;

            self.generation += 1;
            tracing::info!(
                "Created GPU device on '{}' (generation {})",
                bundle.capabilities.adapter_name,
                self.generation
            );
            self.current = Some(DeviceContext {
                device: bundle.device,
                capabilities: bundle.capabilities,
                generation: self.generation,
            });
        }

        self.current
            .as_ref()
            .ok_or_else(|| RenderError::DeviceUnavailable("device slot empty".to_string()))
    }

    /// Record that the driver reported the device as lost.
    pub fn mark_lost(&mut self) {
        if self.current.is_some() && !self.lost {
            tracing::warn!("GPU device generation {} lost", self.generation);
        }
        self.lost = true;
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Polls the driver for asynchronous device loss, marking the slot when it happened.
    pub fn check(&mut self, driver: &mut dyn GpuDriver) -> Result<(), RenderError> {
        let Some(context) = self.current.as_ref() else {
            return Ok(());
        };
        match driver.poll_device(&context.device) {
            Ok(()) => Ok(()),
            Err(DriverError::DeviceLost) => {
                self.mark_lost();
                Err(RenderError::DeviceLost)
            }
            Err(e) => {
                tracing::warn!("Device poll failed: {}", e);
                Ok(())
            }
        }
    }

    /// The live device, if any. Never creates one.
    pub fn get(&self) -> Option<&DeviceContext> {
        if self.lost {
            return None;
        }
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of times a lost device was replaced.
    pub fn reinitializations(&self) -> u32 {
        self.reinitializations
    }

    /// Release the device. Safe to call repeatedly; only the first call reaches the driver.
    pub fn release(&mut self, driver: &mut dyn GpuDriver) {
        if let Some(context) = self.current.take() {
            tracing::info!("Releasing GPU device (generation {})", context.generation);
            driver.release_device(context.device);
        }
        self.lost = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_test_utils::{MockGpuDriver, MockOp};

    #[test]
    fn test_acquire_is_idempotent() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let mut slot = DeviceSlot::new(DeviceRequest::default());

        let first = slot.acquire(&mut driver).unwrap().generation();
        let second = slot.acquire(&mut driver).unwrap().generation();
        assert_eq!(first, second);
        assert_eq!(mock.count_device_creates(), 1);
    }

    #[test]
    fn test_no_adapter_is_unavailable() {
        let mut driver = MockGpuDriver::without_adapter();
        let mut slot = DeviceSlot::new(DeviceRequest::default());

        let err = slot.acquire(&mut driver).unwrap_err();
        assert!(matches!(err, RenderError::DeviceUnavailable(_)));
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_lost_device_is_replaced() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let mut slot = DeviceSlot::new(DeviceRequest::default());
        slot.acquire(&mut driver).unwrap();

        mock.lose_device();
        assert_eq!(slot.check(&mut driver), Err(RenderError::DeviceLost));
        assert!(slot.is_lost());
        assert!(slot.get().is_none());

        let generation = slot.acquire(&mut driver).unwrap().generation();
        assert_eq!(generation, 2);
        assert_eq!(slot.reinitializations(), 1);
        assert_eq!(mock.live_devices(), 1);
    }

    #[test]
    fn test_failed_reinit_leaves_slot_empty() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let mut slot = DeviceSlot::new(DeviceRequest::default());
        slot.acquire(&mut driver).unwrap();

        slot.mark_lost();
        mock.fail_next(MockOp::RequestDevice, DriverError::NoAdapter);
        assert!(slot.acquire(&mut driver).is_err());
        assert!(slot.get().is_none());
        assert_eq!(mock.live_devices(), 0);
    }

    #[test]
    fn test_release_once() {
        let mock = MockGpuDriver::new();
        let mut driver = mock.clone();
        let mut slot = DeviceSlot::new(DeviceRequest::default());
        slot.acquire(&mut driver).unwrap();

        slot.release(&mut driver);
        slot.release(&mut driver);
        assert_eq!(mock.live_devices(), 0);
        assert!(mock.violations().is_empty());
    }
}
