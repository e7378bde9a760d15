//! The render thread.
//!
//! [`RenderWorker`] owns every GPU object of a bridge session: the device slot, the surface
//! binding and the render core. It applies lifecycle events in delivery order and ticks the
//! scene while the scheduler is running.

use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::Instant;

use lumora_core::config::Config;
use lumora_core::profiling::{self, profile_function, profile_scope};
use lumora_core::InputState;
use lumora_render::{
    DeviceSlot, ErrorKind, FrameState, GpuDriver, PresentableTarget, RebindOutcome, RenderCore,
    RenderError, Scene, SurfaceBinding, SurfaceDescriptor, WindowRegistry,
};

use crate::callbacks::HostCallbacks;
use crate::error::SchedulerError;
use crate::input::InputQueue;
use crate::lifecycle::{LifecycleEvent, LifecycleReceiver};
use crate::pacing::FramePacer;
use crate::scheduler::{FrameScheduler, SchedulerAction, SchedulerState};
use crate::session::Session;
use crate::status::{BridgeStatus, StatusHandle};

/// What a single [`RenderWorker::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was presented
    Presented { frame_index: u64 },
    /// The frame was dropped; the scheduler may have paused or stopped as a result
    Skipped,
    /// The scheduler is not running
    Idle,
    Stopped,
}

pub(crate) struct WorkerParts {
    pub config: Config,
    pub driver: Box<dyn GpuDriver>,
    pub scene: Box<dyn Scene>,
    pub callbacks: Box<dyn HostCallbacks>,
    pub slot: DeviceSlot,
    pub windows: WindowRegistry,
    pub events: LifecycleReceiver,
    pub input: Arc<InputQueue>,
    pub status: StatusHandle,
}

/// Render thread state machine.
///
/// Normally driven by [`run`](Self::run) on a thread spawned by
/// [`BridgeBuilder::spawn`](crate::BridgeBuilder::spawn). Tests and hosts with their own loop
/// can obtain one from [`BridgeBuilder::build`](crate::BridgeBuilder::build) and call
/// [`run_once`](Self::run_once) instead.
pub struct RenderWorker {
    config: Config,
    driver: Box<dyn GpuDriver>,
    scene: Box<dyn Scene>,
    callbacks: Box<dyn HostCallbacks>,
    windows: WindowRegistry,
    events: LifecycleReceiver,
    input: Arc<InputQueue>,
    input_state: InputState,
    status: StatusHandle,

    slot: DeviceSlot,
    binding: Option<SurfaceBinding>,
    core: RenderCore,
    frame: FrameState,
    scheduler: FrameScheduler,
    pacer: FramePacer,
    session: Session,

    /// Latest surface the host reported, cleared when it is destroyed
    surface: Option<SurfaceDescriptor>,
    reinit_attempts: u32,
    /// One automatic rebind per resize or surface event
    auto_rebind_available: bool,
    fatal_reported: bool,
    torn_down: bool,
}

impl RenderWorker {
    pub(crate) fn new(parts: WorkerParts) -> Self {
        let pacer = FramePacer::new(parts.config.pacing);
        Self {
            config: parts.config,
            driver: parts.driver,
            scene: parts.scene,
            callbacks: parts.callbacks,
            windows: parts.windows,
            events: parts.events,
            input: parts.input,
            input_state: InputState::new(),
            status: parts.status,
            slot: parts.slot,
            binding: None,
            core: RenderCore::new(),
            frame: FrameState::new(),
            scheduler: FrameScheduler::new(),
            pacer,
            session: Session::Dormant,
            surface: None,
            reinit_attempts: 0,
            auto_rebind_available: true,
            fatal_reported: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn binding(&self) -> Option<&SurfaceBinding> {
        self.binding.as_ref()
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn device_generation(&self) -> u64 {
        self.slot.generation()
    }

    /// Idle/Paused -> Running.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        let was_paused = self.scheduler.state() == SchedulerState::Paused;
        self.scheduler.start()?;
        self.begin_running(was_paused);
        Ok(())
    }

    /// Running -> Paused. Nothing is in flight between ticks, so no frame is cut short.
    pub fn pause(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.pause()?;
        self.scene.on_paused();
        self.publish_status();
        Ok(())
    }

    /// Paused -> Running, rebinding to `descriptor` first when given.
    ///
    /// A rebind that loses the device goes through recovery, which rebinds `descriptor` on the
    /// new device before the scheduler resumes. Any other failed rebind is reported through
    /// [`HostCallbacks`] and leaves the scheduler paused with
    /// [`SchedulerError::SurfaceUnavailable`].
    pub fn resume(&mut self, descriptor: Option<SurfaceDescriptor>) -> Result<(), SchedulerError> {
        let from = self.scheduler.state();
        if from != SchedulerState::Paused {
            return Err(SchedulerError::IllegalTransition {
                from,
                action: SchedulerAction::Resume,
            });
        }

        if let Some(descriptor) = descriptor {
            let descriptor = descriptor.with_max_frame_latency(self.config.max_frame_latency);
            self.surface = Some(descriptor);
            self.auto_rebind_available = true;
            if let Err(e) = self.bind_surface(descriptor) {
                self.handle_error(e);
                if !self.has_valid_surface() {
                    return Err(SchedulerError::SurfaceUnavailable);
                }
            }
        }

        self.scheduler.resume()?;
        self.begin_running(true);
        Ok(())
    }

    /// Any state -> Stopped. Releases every GPU object; idempotent.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.stop()?;
        self.teardown();
        self.session = Session::Stopped;
        self.publish_status();
        Ok(())
    }

    /// Apply one lifecycle event.
    pub fn handle_event(&mut self, event: LifecycleEvent) {
        profile_function!();
        tracing::debug!("Lifecycle event: {}", event.name());

        if self.scheduler.is_stopped() {
            tracing::debug!("Ignoring {} after stop", event.name());
            return;
        }

        match event {
            LifecycleEvent::SurfaceCreated(descriptor) => self.surface_created(descriptor),
            LifecycleEvent::SurfaceChanged(descriptor) => self.surface_changed(descriptor),
            LifecycleEvent::SurfaceDestroyed => self.surface_destroyed(),
            LifecycleEvent::Paused => {
                if let Err(e) = self.pause() {
                    tracing::debug!("Host pause ignored: {}", e);
                }
            }
            LifecycleEvent::Resumed => {
                if self.has_valid_surface() {
                    if let Err(e) = self.resume(None) {
                        tracing::debug!("Host resume ignored: {}", e);
                    }
                } else {
                    tracing::debug!("Host resumed without a surface, waiting for one");
                }
            }
            LifecycleEvent::Destroy => {
                let _ = self.stop();
            }
        }
        self.publish_status();
    }

    /// Render one frame if the scheduler is running.
    pub fn tick(&mut self) -> TickOutcome {
        if self.scheduler.is_stopped() {
            return TickOutcome::Stopped;
        }
        if !self.scheduler.is_running() {
            return TickOutcome::Idle;
        }

        profiling::new_frame();
        profile_function!();

        let started = Instant::now();
        self.pacer.begin_tick(started);
        self.frame.begin_tick(started);
        self.drain_input();

        let outcome = match self.render_frame() {
            Ok(Some(frame_index)) => {
                self.frame.mark_presented(Instant::now());
                if self.config.frame_statistics {
                    let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    self.callbacks.on_frame_statistics(frame_index, micros);
                }
                TickOutcome::Presented { frame_index }
            }
            Ok(None) => TickOutcome::Skipped,
            Err(e) => {
                self.handle_error(e);
                if self.scheduler.is_stopped() {
                    TickOutcome::Stopped
                } else {
                    TickOutcome::Skipped
                }
            }
        };
        self.publish_status();
        outcome
    }

    /// Apply every queued lifecycle event, then tick once.
    pub fn run_once(&mut self) -> TickOutcome {
        self.drain_events();
        self.tick()
    }

    /// Run until stopped or the host side disconnects.
    ///
    /// Blocks on the lifecycle channel while not running.
    pub fn run(mut self) {
        tracing::info!("Render thread started");

        while !self.scheduler.is_stopped() {
            if !self.scheduler.is_running() {
                match self.events.recv() {
                    Ok(event) => self.handle_event(event),
                    Err(_) => self.disconnected(),
                }
                continue;
            }

            self.drain_events();
            self.tick();

            if let Some(wait) = self.pacer.next_wait(Instant::now()) {
                match self.events.recv_timeout(wait) {
                    Ok(event) => self.handle_event(event),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => self.disconnected(),
                }
            }
        }

        tracing::info!("Render thread exiting");
    }

    fn drain_events(&mut self) {
        while !self.scheduler.is_stopped() {
            match self.events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.disconnected(),
            }
        }
    }

    fn disconnected(&mut self) {
        tracing::warn!("Host side of the bridge went away, stopping");
        let _ = self.stop();
    }

    fn surface_created(&mut self, descriptor: SurfaceDescriptor) {
        let descriptor = descriptor.with_max_frame_latency(self.config.max_frame_latency);
        self.surface = Some(descriptor);
        self.auto_rebind_available = true;
        self.frame.take_pending_resize();

        if let Err(e) = self.bind_surface(descriptor) {
            self.handle_error(e);
        }
        if !self.has_valid_surface() || self.scheduler.is_stopped() {
            return;
        }

        match self.scheduler.state() {
            SchedulerState::Idle => {
                let _ = self.start();
            }
            SchedulerState::Paused => {
                let _ = self.resume(None);
            }
            _ => {}
        }
    }

    fn surface_changed(&mut self, descriptor: SurfaceDescriptor) {
        if descriptor.size.is_empty() {
            tracing::debug!("Ignoring zero-sized surface change");
            return;
        }
        let descriptor = descriptor.with_max_frame_latency(self.config.max_frame_latency);
        self.surface = Some(descriptor);
        self.auto_rebind_available = true;
        self.frame.set_pending_resize(descriptor);
    }

    fn surface_destroyed(&mut self) {
        self.surface = None;
        self.frame.take_pending_resize();
        if self.scheduler.is_running() {
            let _ = self.pause();
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.invalidate(self.driver.as_mut());
        }
        self.session = Session::Dormant;
    }

    fn has_valid_surface(&self) -> bool {
        self.binding.as_ref().is_some_and(|binding| {
            binding.is_valid() && self.windows.is_alive(binding.descriptor().window)
        })
    }

    /// Acquire the device and point the binding at `descriptor`.
    fn bind_surface(&mut self, descriptor: SurfaceDescriptor) -> Result<(), RenderError> {
        profile_function!();

        let device = self.slot.acquire(self.driver.as_mut())?;
        let (outcome, id) = match self.binding.as_mut() {
            Some(binding) => {
                let outcome =
                    binding.rebind(descriptor, device, self.driver.as_mut(), &self.windows)?;
                (outcome, binding.id())
            }
            None => {
                let binding =
                    SurfaceBinding::bind(descriptor, device, self.driver.as_mut(), &self.windows)?;
                let id = binding.id();
                self.binding = Some(binding);
                (RebindOutcome::Recreated, id)
            }
        };

        self.session = Session::Active {
            device_generation: self.slot.generation(),
            binding: id,
        };
        if outcome != RebindOutcome::Unchanged {
            self.scene.on_resized(descriptor.size);
        }
        Ok(())
    }

    /// `Ok(None)` means the frame was dropped without an error worth reporting.
    fn render_frame(&mut self) -> Result<Option<u64>, RenderError> {
        self.slot.check(self.driver.as_mut())?;

        if let Some(descriptor) = self.frame.take_pending_resize() {
            profile_scope!("rebind");
            self.bind_surface(descriptor)?;
        }

        {
            profile_scope!("update");
            self.scene.update(&self.frame, &self.input_state);
        }

        let target = self.acquire_target()?;
        let device = self.slot.get().ok_or(RenderError::DeviceLost)?;
        let binding = self.binding.as_mut().ok_or(RenderError::SurfaceInvalid)?;

        let result = self.core.draw(
            self.driver.as_mut(),
            device,
            &target,
            &self.frame,
            self.scene.as_mut(),
        )?;
        {
            profile_scope!("submit");
            self.driver.submit(device.device(), result.commands)?;
        }

        let frame_index = self.frame.frame_index();
        let presented = {
            profile_scope!("present");
            binding.present(target, self.driver.as_mut(), &self.windows)
        };
        match presented {
            Ok(()) => Ok(Some(frame_index)),
            Err(RenderError::SurfaceOutdated) if self.auto_rebind_available => {
                self.auto_rebind()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn acquire_target(&mut self) -> Result<PresentableTarget, RenderError> {
        let device = self.slot.get().ok_or(RenderError::DeviceLost)?;
        let binding = self.binding.as_mut().ok_or(RenderError::SurfaceInvalid)?;

        match binding.acquire(device, self.driver.as_mut(), &self.windows) {
            Err(RenderError::SurfaceOutdated) if self.auto_rebind_available => {
                self.auto_rebind()?;
                let device = self.slot.get().ok_or(RenderError::DeviceLost)?;
                let binding = self.binding.as_mut().ok_or(RenderError::SurfaceInvalid)?;
                binding.acquire(device, self.driver.as_mut(), &self.windows)
            }
            other => other,
        }
    }

    fn auto_rebind(&mut self) -> Result<(), RenderError> {
        self.auto_rebind_available = false;
        let binding = self.binding.as_mut().ok_or(RenderError::SurfaceInvalid)?;
        let descriptor = *binding.descriptor();
        tracing::debug!("Surface {:?} outdated, rebinding once", binding.id());
        binding.invalidate(self.driver.as_mut());
        self.bind_surface(descriptor)
    }

    fn drain_input(&mut self) {
        profile_function!();

        let drained = self.input.drain();
        if drained.dropped > 0 {
            tracing::warn!("Input queue overflowed, {} events dropped", drained.dropped);
            self.callbacks
                .on_recoverable_error(ErrorKind::InputQueueOverflow);
        }

        self.input_state.new_frame();
        for event in &drained.events {
            self.input_state.on_event(event);
            self.scene.on_input(event);
        }
    }

    fn handle_error(&mut self, error: RenderError) {
        match error {
            RenderError::DeviceLost => self.recover_device(),
            RenderError::DeviceUnavailable(ref reason) => {
                tracing::error!("GPU device unavailable: {}", reason);
                self.fail(ErrorKind::DeviceUnavailable);
            }
            RenderError::Timeout => tracing::debug!("Surface acquire timed out, skipping frame"),
            RenderError::OutOfMemory => self.report(ErrorKind::OutOfMemory),
            RenderError::SurfaceCreationFailed(ref reason) => {
                tracing::warn!("Surface creation failed: {}", reason);
                self.report(ErrorKind::SurfaceCreationFailed);
                self.park_surface();
            }
            RenderError::SurfaceInvalid | RenderError::SurfaceOutdated => {
                self.report(ErrorKind::SurfaceInvalid);
                self.park_surface();
            }
        }
    }

    /// Give up on the current binding until the host creates a new surface.
    fn park_surface(&mut self) {
        if let Some(binding) = self.binding.as_mut() {
            binding.invalidate(self.driver.as_mut());
        }
        if self.scheduler.is_running() {
            let _ = self.pause();
        }
        self.session = Session::Dormant;
    }

    /// Replace a lost device and rebind the host surface, within the recovery policy.
    fn recover_device(&mut self) {
        profile_function!();

        self.slot.mark_lost();
        if let Some(binding) = self.binding.as_mut() {
            binding.invalidate(self.driver.as_mut());
        }
        self.core.release(self.driver.as_mut());

        // Set once an attempt of this recovery has itself lost the device
        let mut attempt_failed = false;
        loop {
            if self.reinit_attempts >= self.config.recovery.max_device_reinit {
                if attempt_failed {
                    tracing::error!(
                        "Device reinitialization failed after {} attempts",
                        self.reinit_attempts
                    );
                    self.fail(ErrorKind::DeviceUnavailable);
                } else {
                    tracing::error!(
                        "GPU device lost after {} reinitialization attempts",
                        self.reinit_attempts
                    );
                    self.fail(ErrorKind::DeviceLost);
                }
                return;
            }

            self.reinit_attempts += 1;
            self.session = Session::Reinitializing {
                attempt: self.reinit_attempts,
            };
            self.publish_status();
            tracing::warn!(
                "GPU device lost, reinitializing (attempt {}/{})",
                self.reinit_attempts,
                self.config.recovery.max_device_reinit
            );

            match self.slot.acquire(self.driver.as_mut()) {
                Ok(_) => {}
                Err(RenderError::DeviceLost) => {
                    self.slot.mark_lost();
                    attempt_failed = true;
                    continue;
                }
                Err(e) => {
                    tracing::error!("Device reinitialization failed: {}", e);
                    self.fail(ErrorKind::DeviceUnavailable);
                    return;
                }
            }

            let Some(descriptor) = self
                .surface
                .filter(|descriptor| self.windows.is_alive(descriptor.window))
            else {
                tracing::info!("Device recovered, waiting for a surface");
                self.session = Session::Dormant;
                return;
            };

            match self.bind_surface(descriptor) {
                Ok(()) => {
                    tracing::info!(
                        "Recovered from device loss (generation {})",
                        self.slot.generation()
                    );
                    return;
                }
                Err(RenderError::DeviceLost) => {
                    self.slot.mark_lost();
                    attempt_failed = true;
                    continue;
                }
                Err(e) => {
                    self.handle_error(e);
                    return;
                }
            }
        }
    }

    fn report(&mut self, kind: ErrorKind) {
        tracing::warn!("Recoverable error: {}", kind);
        self.callbacks.on_recoverable_error(kind);
    }

    /// Stop the session, reporting `kind` to the host exactly once.
    fn fail(&mut self, kind: ErrorKind) {
        if !self.fatal_reported {
            self.fatal_reported = true;
            tracing::error!("Fatal error, stopping render thread: {}", kind);
            self.callbacks.on_fatal_error(kind);
        }
        let _ = self.stop();
    }

    fn begin_running(&mut self, resumed: bool) {
        self.pacer.reset();
        self.frame.reset_timing();
        if resumed {
            self.scene.on_resumed();
        }
        self.publish_status();
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(binding) = self.binding.take() {
            binding.release(self.driver.as_mut());
        }
        self.core.release(self.driver.as_mut());
        self.slot.release(self.driver.as_mut());
        tracing::info!("Render resources released");
    }

    fn publish_status(&self) {
        let surface_size = self
            .binding
            .as_ref()
            .filter(|binding| binding.is_valid())
            .map(SurfaceBinding::size);
        self.status.set(BridgeStatus {
            scheduler: self.scheduler.state(),
            session: self.session,
            frames_presented: self.frame.frame_index(),
            surface_size,
            device_generation: self.slot.generation(),
            dropped_inputs: self.input.dropped_total(),
        });
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for RenderWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWorker")
            .field("state", &self.scheduler.state())
            .field("session", &self.session)
            .field("frame_index", &self.frame.frame_index())
            .finish_non_exhaustive()
    }
}
