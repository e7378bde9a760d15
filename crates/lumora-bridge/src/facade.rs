use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use lumora_core::config::{Config, ProfilingMode};
use lumora_core::InputEvent;
use lumora_render::{
    ClearScene, DeviceRequest, DeviceSlot, GpuDriver, HostWindowId, Scene, SurfaceDescriptor,
    WindowRegistry,
};
use parking_lot::Mutex;

use crate::callbacks::HostCallbacks;
use crate::error::BridgeError;
use crate::input::InputQueue;
use crate::lifecycle::{self, LifecycleEvent, LifecycleSender};
use crate::status::{BridgeStatus, StatusHandle};
use crate::worker::{RenderWorker, WorkerParts};

/// Assembles a [`Bridge`] and its render thread.
///
/// # Example
///
/// ```no_run
/// use lumora_bridge::BridgeBuilder;
/// use lumora_render::{ClearScene, WgpuDriver};
///
/// let bridge = BridgeBuilder::new(WgpuDriver::new())
///     .scene(ClearScene::default())
///     .spawn()
///     .expect("render thread");
///
/// // Hand window handles to `bridge.windows()` and forward host callbacks.
/// bridge.on_destroy().expect("clean shutdown");
/// ```
pub struct BridgeBuilder {
    config: Config,
    driver: Box<dyn GpuDriver>,
    scene: Box<dyn Scene>,
    callbacks: Box<dyn HostCallbacks>,
    device_request: DeviceRequest,
    windows: WindowRegistry,
}

impl BridgeBuilder {
    pub fn new(driver: impl GpuDriver + 'static) -> Self {
        Self {
            config: Config::default(),
            driver: Box::new(driver),
            scene: Box::new(ClearScene::default()),
            callbacks: Box::new(()),
            device_request: DeviceRequest::default(),
            windows: WindowRegistry::new(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn scene(mut self, scene: impl Scene + 'static) -> Self {
        self.scene = Box::new(scene);
        self
    }

    pub fn callbacks(mut self, callbacks: impl HostCallbacks + 'static) -> Self {
        self.callbacks = Box::new(callbacks);
        self
    }

    pub fn device_request(mut self, request: DeviceRequest) -> Self {
        self.device_request = request;
        self
    }

    /// Share an existing registry instead of creating a fresh one.
    pub fn windows(mut self, windows: WindowRegistry) -> Self {
        self.windows = windows;
        self
    }

    /// Build the bridge and a worker the caller drives itself.
    pub fn build(self) -> (Bridge, RenderWorker) {
        if self.config.profiling != ProfilingMode::Off {
            lumora_core::profiling::init_profiling(self.config.profiling);
        }

        let (sender, receiver) = lifecycle::channel();
        let input = Arc::new(InputQueue::new(self.config.input_queue_capacity));
        let status = StatusHandle::default();

        let bridge = Bridge {
            events: sender,
            input: Arc::clone(&input),
            windows: self.windows.clone(),
            current_window: Mutex::new(None),
            status: status.clone(),
            render_thread: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        };
        let worker = RenderWorker::new(WorkerParts {
            config: self.config,
            driver: self.driver,
            scene: self.scene,
            callbacks: self.callbacks,
            slot: DeviceSlot::new(self.device_request),
            windows: self.windows,
            events: receiver,
            input,
            status,
        });
        (bridge, worker)
    }

    /// Build the bridge and start its render thread.
    pub fn spawn(self) -> Result<Bridge, BridgeError> {
        let thread_name = self.config.render_thread_name.clone();
        let (bridge, worker) = self.build();

        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(BridgeError::ThreadSpawn)?;
        *bridge.render_thread.lock() = Some(handle);

        tracing::debug!("Render thread spawned");
        Ok(bridge)
    }
}

/// Host-facing side of a rendering session.
///
/// Every method is a non-blocking enqueue onto the render thread, except
/// [`on_destroy`](Self::on_destroy), which also waits for the thread to finish. Safe to share
/// between host threads.
pub struct Bridge {
    events: LifecycleSender,
    input: Arc<InputQueue>,
    windows: WindowRegistry,
    /// Window of the most recent surface-created event
    current_window: Mutex<Option<HostWindowId>>,
    status: StatusHandle,
    render_thread: Mutex<Option<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

impl Bridge {
    /// Registry host windows must be registered in before their surface is reported.
    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn on_surface_created(&self, descriptor: SurfaceDescriptor) -> Result<(), BridgeError> {
        *self.current_window.lock() = Some(descriptor.window);
        self.send(LifecycleEvent::SurfaceCreated(descriptor))
    }

    /// Zero-sized changes are dropped here; the render thread never sees them.
    pub fn on_surface_changed(&self, descriptor: SurfaceDescriptor) -> Result<(), BridgeError> {
        if descriptor.size.is_empty() {
            tracing::debug!("Ignoring zero-sized surface change to {}", descriptor.size);
            return Ok(());
        }
        self.send(LifecycleEvent::SurfaceChanged(descriptor))
    }

    /// Retires the current window before the render thread hears about it, so no frame can be
    /// acquired against it from this point on.
    pub fn on_surface_destroyed(&self) -> Result<(), BridgeError> {
        if let Some(window) = self.current_window.lock().take() {
            self.windows.retire(window);
        }
        self.send(LifecycleEvent::SurfaceDestroyed)
    }

    pub fn on_pause(&self) -> Result<(), BridgeError> {
        self.send(LifecycleEvent::Paused)
    }

    pub fn on_resume(&self) -> Result<(), BridgeError> {
        self.send(LifecycleEvent::Resumed)
    }

    /// Queue an input event. Never blocks; overflow drops the oldest event.
    pub fn on_input_event(&self, event: InputEvent) {
        if self.input.push(event) {
            tracing::trace!("Input queue full, dropped oldest event");
        }
    }

    /// Stop the render thread and wait for it to release its GPU resources.
    ///
    /// Idempotent. Without a spawned thread the stop is only queued.
    pub fn on_destroy(&self) -> Result<(), BridgeError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // The worker may already be gone after a fatal error
        let _ = self.events.send(LifecycleEvent::Destroy);
        if let Some(window) = self.current_window.lock().take() {
            self.windows.retire(window);
        }

        let handle = self.render_thread.lock().take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| BridgeError::RenderThreadPanicked)?;
            tracing::debug!("Render thread joined");
        }
        Ok(())
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Latest snapshot published by the render thread.
    pub fn status(&self) -> BridgeStatus {
        self.status.get()
    }

    pub fn dropped_inputs(&self) -> u64 {
        self.input.dropped_total()
    }

    fn send(&self, event: LifecycleEvent) -> Result<(), BridgeError> {
        if self.is_destroyed() {
            return Err(BridgeError::Disconnected);
        }
        self.events
            .send(event)
            .map_err(|_| BridgeError::Disconnected)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        if let Err(e) = self.on_destroy() {
            tracing::error!("Bridge shutdown failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("status", &self.status())
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}
