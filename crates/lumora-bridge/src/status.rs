use std::sync::Arc;

use lumora_core::PhysicalSize;
use parking_lot::Mutex;

use crate::scheduler::SchedulerState;
use crate::session::Session;

/// Snapshot of the render thread, published after every lifecycle event and tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStatus {
    pub scheduler: SchedulerState,
    pub session: Session,
    /// Frames presented since the bridge started
    pub frames_presented: u64,
    /// Size of the valid surface binding, if any
    pub surface_size: Option<PhysicalSize<u32>>,
    pub device_generation: u64,
    pub dropped_inputs: u64,
}

impl Default for BridgeStatus {
    fn default() -> Self {
        Self {
            scheduler: SchedulerState::Idle,
            session: Session::Dormant,
            frames_presented: 0,
            surface_size: None,
            device_generation: 0,
            dropped_inputs: 0,
        }
    }
}

/// Shared cell the render thread writes and the host reads.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatusHandle(Arc<Mutex<BridgeStatus>>);

impl StatusHandle {
    pub(crate) fn get(&self) -> BridgeStatus {
        *self.0.lock()
    }

    pub(crate) fn set(&self, status: BridgeStatus) {
        *self.0.lock() = status;
    }
}
