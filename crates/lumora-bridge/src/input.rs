use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use lumora_core::InputEvent;
use parking_lot::Mutex;

/// Events taken from the queue in one drain.
#[derive(Debug, Default)]
pub struct DrainedInput {
    pub events: Vec<InputEvent>,
    /// Events dropped to overflow since the previous drain.
    pub dropped: u64,
}

/// Bounded host-to-render input queue.
///
/// `push` never blocks on the consumer: when full, the oldest event is discarded and counted.
/// The lock is held only for the push or the swap, never while events are processed.
#[derive(Debug)]
pub struct InputQueue {
    events: Mutex<VecDeque<InputEvent>>,
    capacity: usize,
    dropped_total: AtomicU64,
    dropped_unreported: AtomicU64,
}

impl InputQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped_total: AtomicU64::new(0),
            dropped_unreported: AtomicU64::new(0),
        }
    }

    /// Enqueue an event. Returns `true` if an older event was dropped to make room.
    pub fn push(&self, event: InputEvent) -> bool {
        let dropped = {
            let mut events = self.events.lock();
            let dropped = if events.len() >= self.capacity {
                events.pop_front();
                true
            } else {
                false
            };
            events.push_back(event);
            dropped
        };

        if dropped {
            self.dropped_total.fetch_add(1, Ordering::Relaxed);
            self.dropped_unreported.fetch_add(1, Ordering::Relaxed);
        }
        dropped
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> DrainedInput {
        let events = {
            let mut events = self.events.lock();
            let mut taken = VecDeque::with_capacity(self.capacity);
            std::mem::swap(&mut *events, &mut taken);
            taken
        };
        DrainedInput {
            events: events.into(),
            dropped: self.dropped_unreported.swap(0, Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped over the queue's lifetime.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(n: usize) -> InputEvent {
        InputEvent::Text(n.to_string())
    }

    #[test]
    fn test_drain_preserves_order() {
        let queue = InputQueue::new(8);
        for i in 0..5 {
            assert!(!queue.push(text(i)));
        }
        let drained = queue.drain();
        assert_eq!(drained.events, (0..5).map(text).collect::<Vec<_>>());
        assert_eq!(drained.dropped, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let queue = InputQueue::new(4);
        let dropped = (0..10).filter(|i| queue.push(text(*i))).count();
        assert_eq!(dropped, 6);

        let drained = queue.drain();
        assert_eq!(drained.events, (6..10).map(text).collect::<Vec<_>>());
        assert_eq!(drained.dropped, 6);

        // Drop count is reported once
        assert_eq!(queue.drain().dropped, 0);
        assert_eq!(queue.dropped_total(), 6);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let queue = InputQueue::new(0);
        queue.push(text(1));
        queue.push(text(2));
        assert_eq!(queue.drain().events, vec![text(2)]);
    }

    #[test]
    fn test_concurrent_producer_never_blocks_on_consumer() {
        use std::sync::Arc;

        let queue = Arc::new(InputQueue::new(16));
        let producer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    queue.push(text(i));
                }
            })
        };

        let mut received = 0u64;
        while !producer.is_finished() {
            received += queue.drain().events.len() as u64;
        }
        producer.join().unwrap();
        received += queue.drain().events.len() as u64;

        assert_eq!(received + queue.dropped_total(), 10_000);
    }
}
