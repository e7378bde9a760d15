use std::time::Duration;

/// Configuration for a Lumora bridge session.
///
/// # Example
///
/// ```
/// use lumora_core::config::{Config, FramePacing};
///
/// let config = Config::default()
///     .with_input_queue_capacity(64)
///     .with_pacing(FramePacing::Fixed { fps: 30 })
///     .with_frame_statistics(true);
///
/// assert_eq!(config.input_queue_capacity, 64);
/// assert_eq!(config.recovery.max_device_reinit, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of undelivered input events. Overflow drops the oldest event.
    pub input_queue_capacity: usize,
    /// Device loss recovery policy.
    pub recovery: RecoveryPolicy,
    /// How the render loop paces its ticks.
    pub pacing: FramePacing,
    /// Report per-frame statistics to the host.
    pub frame_statistics: bool,
    /// Number of frames the swapchain may queue ahead of presentation.
    pub max_frame_latency: u32,
    /// Name given to the render thread.
    pub render_thread_name: String,
    pub profiling: ProfilingMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_queue_capacity: 256,
            recovery: RecoveryPolicy::default(),
            pacing: FramePacing::PresentLimited,
            frame_statistics: false,
            max_frame_latency: 2,
            render_thread_name: "lumora-render".to_string(),
            profiling: ProfilingMode::Off,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_queue_capacity(mut self, capacity: usize) -> Self {
        self.input_queue_capacity = capacity.max(1);
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_pacing(mut self, pacing: FramePacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_frame_statistics(mut self, enabled: bool) -> Self {
        self.frame_statistics = enabled;
        self
    }

    pub fn with_max_frame_latency(mut self, frames: u32) -> Self {
        self.max_frame_latency = frames.max(1);
        self
    }

    pub fn with_render_thread_name(mut self, name: impl Into<String>) -> Self {
        self.render_thread_name = name.into();
        self
    }

    pub fn with_profiling(mut self, profiling: ProfilingMode) -> Self {
        self.profiling = profiling;
        self
    }
}

/// Bounds automatic recovery after the GPU device is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Reinitialization attempts allowed per session. Zero disables recovery.
    pub max_device_reinit: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_device_reinit: 1,
        }
    }
}

impl RecoveryPolicy {
    pub const fn disabled() -> Self {
        Self {
            max_device_reinit: 0,
        }
    }

    pub const fn attempts(max_device_reinit: u32) -> Self {
        Self { max_device_reinit }
    }
}

/// Frame pacing strategy for the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePacing {
    /// Tick as fast as presentation allows; vsync present modes throttle the loop.
    PresentLimited,
    /// Sleep between ticks to hold a fixed rate.
    Fixed { fps: u32 },
}

impl FramePacing {
    /// Target interval between tick starts, if any.
    pub fn interval(&self) -> Option<Duration> {
        match *self {
            FramePacing::PresentLimited => None,
            FramePacing::Fixed { fps } if fps > 0 => {
                Some(Duration::from_nanos(1_000_000_000 / u64::from(fps)))
            }
            FramePacing::Fixed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling scopes are disabled
    Off,
    /// Profiling scopes are recorded in-process
    On,
    /// Profiling scopes are recorded and served to external tools such as 'puffin_viewer'
    WithServer,
}
