//! Session state machine.

/// Represents the lifecycle state of a helper session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No helper process has been spawned yet.
    #[default]
    NotStarted,
    /// The helper process is alive and owns the session's pipes.
    Running,
    /// Shutdown is in progress.
    Closing,
    /// The helper process has been shut down.
    Closed,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - NotStarted -> Running
    /// - Running -> Closing
    /// - Closing -> Closed
    /// - Closed -> Running (explicit restart)
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (NotStarted, Running) | (Running, Closing) | (Closing, Closed) | (Closed, Running)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::GowershellError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if a helper process is attached.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }

    /// Check if dispatch may lazily start the helper.
    pub fn can_autostart(&self) -> bool {
        matches!(self, SessionState::NotStarted)
    }
}
