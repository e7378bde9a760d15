//! Shared fixtures for bridge scenario tests.
#![allow(dead_code)]

use std::sync::Arc;

use lumora_bridge::{Bridge, BridgeBuilder, ErrorKind, HostCallbacks, RenderWorker, TickOutcome};
use lumora_core::config::Config;
use lumora_core::{InputEvent, InputState, PhysicalSize};
use lumora_render::{DrawList, FrameState, HostWindowId, PipelineKind, Scene, SurfaceDescriptor};
use lumora_test_utils::MockGpuDriver;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Fatal(ErrorKind),
    Recoverable(ErrorKind),
    Frame(u64),
}

/// Host callbacks that remember everything they were told.
#[derive(Debug, Clone, Default)]
pub struct RecordingCallbacks {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingCallbacks {
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    pub fn fatal(&self) -> Vec<ErrorKind> {
        self.reports
            .lock()
            .iter()
            .filter_map(|report| match report {
                Report::Fatal(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn recoverable(&self) -> Vec<ErrorKind> {
        self.reports
            .lock()
            .iter()
            .filter_map(|report| match report {
                Report::Recoverable(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn frames(&self) -> Vec<u64> {
        self.reports
            .lock()
            .iter()
            .filter_map(|report| match report {
                Report::Frame(index) => Some(*index),
                _ => None,
            })
            .collect()
    }
}

impl HostCallbacks for RecordingCallbacks {
    fn on_fatal_error(&mut self, kind: ErrorKind) {
        self.reports.lock().push(Report::Fatal(kind));
    }

    fn on_frame_statistics(&mut self, frame_index: u64, _duration_micros: u64) {
        self.reports.lock().push(Report::Frame(frame_index));
    }

    fn on_recoverable_error(&mut self, kind: ErrorKind) {
        self.reports.lock().push(Report::Recoverable(kind));
    }
}

#[derive(Debug, Default)]
pub struct SceneLog {
    pub resized: Vec<PhysicalSize<u32>>,
    pub inputs: Vec<InputEvent>,
    pub paused: usize,
    pub resumed: usize,
    pub recorded: usize,
}

/// Clears and draws a triangle, logging every hook.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    log: Arc<Mutex<SceneLog>>,
}

impl RecordingScene {
    pub fn log(&self) -> parking_lot::MutexGuard<'_, SceneLog> {
        self.log.lock()
    }
}

impl Scene for RecordingScene {
    fn on_input(&mut self, event: &InputEvent) {
        self.log.lock().inputs.push(event.clone());
    }

    fn on_resized(&mut self, size: PhysicalSize<u32>) {
        self.log.lock().resized.push(size);
    }

    fn on_paused(&mut self) {
        self.log.lock().paused += 1;
    }

    fn on_resumed(&mut self) {
        self.log.lock().resumed += 1;
    }

    fn update(&mut self, _frame: &FrameState, _input: &InputState) {}

    fn record(&mut self, _frame: &FrameState, draws: &mut DrawList) {
        self.log.lock().recorded += 1;
        draws
            .clear(lumora_render::wgpu::Color::BLACK)
            .draw(PipelineKind::Triangle);
    }
}

/// A bridge driven by hand against the mock driver.
pub struct Harness {
    pub mock: MockGpuDriver,
    pub callbacks: RecordingCallbacks,
    pub scene: RecordingScene,
    pub bridge: Bridge,
    pub worker: RenderWorker,
}

impl Harness {
    pub fn new(config: Config) -> Self {
        Self::with_mock(config, MockGpuDriver::new())
    }

    pub fn with_mock(config: Config, mock: MockGpuDriver) -> Self {
        let callbacks = RecordingCallbacks::default();
        let scene = RecordingScene::default();
        let (bridge, worker) = BridgeBuilder::new(mock.clone())
            .config(config)
            .scene(scene.clone())
            .callbacks(callbacks.clone())
            .build();
        Self {
            mock,
            callbacks,
            scene,
            bridge,
            worker,
        }
    }

    pub fn window(&self) -> HostWindowId {
        self.bridge.windows().register_headless()
    }

    /// Register a window and report its surface.
    pub fn create_surface(&self, width: u32, height: u32) -> HostWindowId {
        let window = self.window();
        self.bridge
            .on_surface_created(SurfaceDescriptor::new(window, (width, height)))
            .unwrap();
        window
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.worker.run_once()
    }

    pub fn tick_n(&mut self, n: usize) -> Vec<TickOutcome> {
        (0..n).map(|_| self.tick()).collect()
    }
}

pub fn presented(outcome: TickOutcome) -> bool {
    matches!(outcome, TickOutcome::Presented { .. })
}
