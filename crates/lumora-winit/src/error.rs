use lumora_bridge::BridgeError;
use winit::error::EventLoopError;

#[derive(Debug)]
pub enum RunError {
    EventLoop(EventLoopError),
    Bridge(BridgeError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            RunError::Bridge(e) => write!(f, "Bridge error: {}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Bridge(e) => Some(e),
        }
    }
}

impl From<EventLoopError> for RunError {
    fn from(e: EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<BridgeError> for RunError {
    fn from(e: BridgeError) -> Self {
        RunError::Bridge(e)
    }
}
