use crate::error::SchedulerError;

/// Render loop state.
///
/// ```text
/// Idle --start--> Running --pause--> Paused --resume--> Running
///   any --stop--> Stopped (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerAction {
    Start,
    Pause,
    Resume,
    Stop,
}

/// The frame scheduler's state machine.
///
/// Transitions are pure; the render worker applies their side effects. An illegal transition
/// is a no-op that reports [`SchedulerError::IllegalTransition`].
#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SchedulerState::Stopped
    }

    /// Idle or Paused to Running.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.transition(SchedulerAction::Start, |state| {
            matches!(state, SchedulerState::Idle | SchedulerState::Paused)
                .then_some(SchedulerState::Running)
        })
    }

    /// Running to Paused.
    pub fn pause(&mut self) -> Result<(), SchedulerError> {
        self.transition(SchedulerAction::Pause, |state| {
            (state == SchedulerState::Running).then_some(SchedulerState::Paused)
        })
    }

    /// Paused to Running.
    pub fn resume(&mut self) -> Result<(), SchedulerError> {
        self.transition(SchedulerAction::Resume, |state| {
            (state == SchedulerState::Paused).then_some(SchedulerState::Running)
        })
    }

    /// Any state to Stopped. Stopping twice is allowed.
    pub fn stop(&mut self) -> Result<(), SchedulerError> {
        self.transition(SchedulerAction::Stop, |_| Some(SchedulerState::Stopped))
    }

    fn transition(
        &mut self,
        action: SchedulerAction,
        next: impl FnOnce(SchedulerState) -> Option<SchedulerState>,
    ) -> Result<(), SchedulerError> {
        match next(self.state) {
            Some(state) => {
                if state != self.state {
                    tracing::debug!("Scheduler {:?} -> {:?}", self.state, state);
                }
                self.state = state;
                Ok(())
            }
            None => Err(SchedulerError::IllegalTransition {
                from: self.state,
                action,
            }),
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}
