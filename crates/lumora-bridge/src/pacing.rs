use std::time::{Duration, Instant};

use lumora_core::config::FramePacing;

/// Decides how long the render loop may wait before the next tick.
///
/// Frame timing seen by scenes lives in [`FrameState`](lumora_render::FrameState); the pacer
/// only remembers when the last tick started.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    last_tick: Option<Instant>,
}

impl FramePacer {
    pub fn new(pacing: FramePacing) -> Self {
        Self {
            interval: pacing.interval(),
            last_tick: None,
        }
    }

    pub fn begin_tick(&mut self, now: Instant) {
        self.last_tick = Some(now);
    }

    /// How long to wait before the next tick, or `None` to tick immediately.
    pub fn next_wait(&self, now: Instant) -> Option<Duration> {
        let interval = self.interval?;
        let last = self.last_tick?;
        let deadline = last + interval;
        (deadline > now).then(|| deadline - now)
    }

    /// Forget the last tick so the first frame after a pause starts without waiting.
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_limited_never_waits() {
        let mut pacer = FramePacer::new(FramePacing::PresentLimited);
        let now = Instant::now();
        pacer.begin_tick(now);
        assert_eq!(pacer.next_wait(now), None);
    }

    #[test]
    fn test_fixed_rate_waits_for_remainder() {
        let mut pacer = FramePacer::new(FramePacing::Fixed { fps: 50 });
        let now = Instant::now();
        assert_eq!(pacer.next_wait(now), None);

        pacer.begin_tick(now);
        assert_eq!(
            pacer.next_wait(now + Duration::from_millis(5)),
            Some(Duration::from_millis(15))
        );
        assert_eq!(pacer.next_wait(now + Duration::from_millis(25)), None);
    }

    #[test]
    fn test_reset_skips_wait() {
        let mut pacer = FramePacer::new(FramePacing::Fixed { fps: 10 });
        let now = Instant::now();
        pacer.begin_tick(now);
        assert!(pacer.next_wait(now).is_some());

        pacer.reset();
        assert_eq!(pacer.next_wait(now), None);
    }
}
