use crate::error::ErrorKind;

/// Notifications from the render thread to the host.
///
/// Every method has a no-op default. Calls are made on the render thread; implementations
/// that touch host UI must hand off to the host's own thread.
pub trait HostCallbacks: Send {
    /// The session ended and will not recover. Called at most once per bridge.
    fn on_fatal_error(&mut self, _kind: ErrorKind) {}

    /// A frame was presented. Only called when frame statistics are enabled.
    fn on_frame_statistics(&mut self, _frame_index: u64, _duration_micros: u64) {}

    /// A non-fatal problem: surface invalid or failed to create, out of memory, input dropped.
    fn on_recoverable_error(&mut self, _kind: ErrorKind) {}
}

impl HostCallbacks for () {}
