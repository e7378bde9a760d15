use std::time::{Duration, Instant};

use crate::surface::SurfaceDescriptor;

/// Statistics for a rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub draw_calls: usize,
}

/// Per-binding frame bookkeeping. Only the render thread touches it.
#[derive(Debug)]
pub struct FrameState {
    frame_index: u64,
    last_presented: Option<Instant>,
    pending_resize: Option<SurfaceDescriptor>,
    started: Instant,
    delta: Duration,
    last_tick: Option<Instant>,
}

impl FrameState {
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            last_presented: None,
            pending_resize: None,
            started: Instant::now(),
            delta: Duration::ZERO,
            last_tick: None,
        }
    }

    /// Index of the frame currently being produced. Increases by one per presented frame.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn last_presented(&self) -> Option<Instant> {
        self.last_presented
    }

    /// Time since the previous tick began.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Time since this state was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn begin_tick(&mut self, now: Instant) {
        if let Some(last) = self.last_tick {
            self.delta = now.saturating_duration_since(last);
        }
        self.last_tick = Some(now);
    }

    pub fn mark_presented(&mut self, now: Instant) {
        self.last_presented = Some(now);
        self.frame_index += 1;
    }

    /// Queue a rebind for the next tick. A newer resize replaces an older one.
    pub fn set_pending_resize(&mut self, descriptor: SurfaceDescriptor) {
        self.pending_resize = Some(descriptor);
    }

    pub fn pending_resize(&self) -> Option<&SurfaceDescriptor> {
        self.pending_resize.as_ref()
    }

    pub fn take_pending_resize(&mut self) -> Option<SurfaceDescriptor> {
        self.pending_resize.take()
    }

    /// Drop pacing history after a pause so the first frame back has no huge delta.
    pub fn reset_timing(&mut self) {
        self.last_tick = None;
        self.delta = Duration::ZERO;
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_test_utils::HostWindowId;

    #[test]
    fn test_frame_index_advances_on_present() {
        let mut frame = FrameState::new();
        let now = Instant::now();
        frame.begin_tick(now);
        assert_eq!(frame.frame_index(), 0);
        frame.mark_presented(now);
        assert_eq!(frame.frame_index(), 1);
        assert_eq!(frame.last_presented(), Some(now));
    }

    #[test]
    fn test_latest_resize_wins() {
        let mut frame = FrameState::new();
        let window = HostWindowId(1);
        frame.set_pending_resize(SurfaceDescriptor::new(window, (100, 100)));
        frame.set_pending_resize(SurfaceDescriptor::new(window, (200, 100)));
        let pending = frame.take_pending_resize().unwrap();
        assert_eq!(pending.size.width, 200);
        assert!(frame.pending_resize().is_none());
    }

    #[test]
    fn test_delta() {
        let mut frame = FrameState::new();
        let start = Instant::now();
        frame.begin_tick(start);
        frame.begin_tick(start + Duration::from_millis(16));
        assert_eq!(frame.delta(), Duration::from_millis(16));
        frame.reset_timing();
        assert_eq!(frame.delta(), Duration::ZERO);
    }
}
