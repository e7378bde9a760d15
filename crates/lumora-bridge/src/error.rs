use crate::scheduler::{SchedulerAction, SchedulerState};

pub use lumora_render::ErrorKind;

/// A scheduler transition that did not happen.
///
/// The scheduler state is left untouched either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    IllegalTransition {
        from: SchedulerState,
        action: SchedulerAction,
    },
    /// `resume` was given a surface that could not be bound
    SurfaceUnavailable,
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::IllegalTransition { from, action } => {
                write!(f, "Cannot {:?} while {:?}", action, from)
            }
            SchedulerError::SurfaceUnavailable => write!(f, "No surface to resume rendering to"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Errors returned to the host by the bridge façade.
#[derive(Debug)]
pub enum BridgeError {
    /// The render thread could not be started
    ThreadSpawn(std::io::Error),
    /// The render thread has exited; the event was not delivered
    Disconnected,
    /// The render thread panicked before it could be joined
    RenderThreadPanicked,
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::ThreadSpawn(e) => write!(f, "Failed to spawn render thread: {}", e),
            BridgeError::Disconnected => write!(f, "Render thread is no longer running"),
            BridgeError::RenderThreadPanicked => write!(f, "Render thread panicked"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}
