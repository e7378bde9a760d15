//! Clear Color Example
//!
//! Opens a window and renders a slowly cycling clear colour on the bridge's render thread.
//! Click (or tap) to toggle a triangle. Frame statistics are logged once a second.
//!
//! Run with: cargo run -p lumora --example clear_color
//! Profile with: cargo run -p lumora --example clear_color --features profiling-server

use std::time::{Duration, Instant};

use lumora::prelude::*;

struct CyclingScene {
    inner: ClearScene,
    hue: f64,
}

impl Scene for CyclingScene {
    fn on_input(&mut self, event: &InputEvent) {
        self.inner.on_input(event);
    }

    fn on_resized(&mut self, size: PhysicalSize<u32>) {
        tracing::info!("Surface is now {}", size);
        self.inner.on_resized(size);
    }

    fn on_paused(&mut self) {
        tracing::info!("Paused");
    }

    fn on_resumed(&mut self) {
        tracing::info!("Resumed");
    }

    fn update(&mut self, frame: &FrameState, _input: &InputState) {
        self.hue = (self.hue + frame.delta().as_secs_f64() * 0.1).fract();
    }

    fn record(&mut self, _frame: &FrameState, draws: &mut DrawList) {
        let angle = self.hue * std::f64::consts::TAU;
        draws.clear(wgpu::Color {
            r: 0.5 + 0.4 * angle.cos(),
            g: 0.5 + 0.4 * (angle + 2.1).cos(),
            b: 0.5 + 0.4 * (angle + 4.2).cos(),
            a: 1.0,
        });
        if self.inner.shows_triangle() {
            draws.draw(PipelineKind::Triangle);
        }
    }
}

struct LoggingCallbacks {
    frames: u64,
    total_micros: u64,
    window_start: Instant,
}

impl LoggingCallbacks {
    fn new() -> Self {
        Self {
            frames: 0,
            total_micros: 0,
            window_start: Instant::now(),
        }
    }
}

impl HostCallbacks for LoggingCallbacks {
    fn on_fatal_error(&mut self, kind: ErrorKind) {
        tracing::error!("Rendering stopped: {}", kind);
    }

    fn on_frame_statistics(&mut self, frame_index: u64, duration_micros: u64) {
        self.frames += 1;
        self.total_micros += duration_micros;
        if self.window_start.elapsed() >= Duration::from_secs(1) {
            tracing::info!(
                "frame {}: {} frames, {:.0} us average CPU time",
                frame_index,
                self.frames,
                self.total_micros as f64 / self.frames as f64
            );
            self.frames = 0;
            self.total_micros = 0;
            self.window_start = Instant::now();
        }
    }

    fn on_recoverable_error(&mut self, kind: ErrorKind) {
        tracing::warn!("Recoverable: {}", kind);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    lumora::core::logging::init();

    let profiling = if cfg!(feature = "profiling-server") {
        ProfilingMode::WithServer
    } else {
        ProfilingMode::Off
    };

    let builder = BridgeBuilder::new(WgpuDriver::new())
        .config(
            Config::default()
                .with_frame_statistics(true)
                .with_profiling(profiling),
        )
        .scene(CyclingScene {
            inner: ClearScene::default(),
            hue: 0.0,
        })
        .callbacks(LoggingCallbacks::new());

    lumora::winit::run(
        builder,
        WindowDescriptor::default()
            .with_title("Lumora - Clear Color")
            .with_size(1280, 720),
    )?;
    Ok(())
}
