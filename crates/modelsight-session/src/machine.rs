//! The session transition table.
//!
//! ```text
//! Scanning ──scan──▶ Validating ──accepted──▶ Downloading ──resolved──▶ Ready ──mounted──▶ Rendering
//!     ▲                  │                         │                                        │
//!     │               rejected                fetch failed                            scene failed
//!     │                  ▼                         ▼                                        ▼
//!     └──rescan / budget exhausted──────────────  Error ◀───────────────────────────────────┘
//! ```

use crate::error::{SessionError, TransitionError};
use crate::state::{MAX_ERRORS, Phase, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A decoded payload arrived.
    Scan,
    /// The payload names a model.
    Accepted,
    /// The payload was rejected by validation.
    Rejected(SessionError),
    /// The model is available locally.
    Resolved,
    FetchFailed(SessionError),
    /// The scene was mounted with the resolved model.
    Mounted,
    /// The scene signalled load completion.
    LoadCompleted,
    SceneFailed(SessionError),
    /// The user asked to scan again.
    Rescan,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Accepted => "accepted",
            Self::Rejected(_) => "rejected",
            Self::Resolved => "resolved",
            Self::FetchFailed(_) => "fetch_failed",
            Self::Mounted => "mounted",
            Self::LoadCompleted => "load_completed",
            Self::SceneFailed(_) => "scene_failed",
            Self::Rescan => "rescan",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionMachine {
    state:      SessionState,
    max_errors: u32,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(MAX_ERRORS)
    }
}

impl SessionMachine {
    /// A machine that starts over after `max_errors` counted failures.
    /// A budget of zero is treated as one.
    pub fn new(max_errors: u32) -> Self {
        Self {
            state:      SessionState::default(),
            max_errors: max_errors.max(1),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }

    /// Apply `event`, returning the new phase.
    ///
    /// Illegal events leave the state untouched.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Phase, TransitionError> {
        let from = self.state.phase;
        let name = event.name();

        match (from, event) {
            (Phase::Scanning, SessionEvent::Scan) => self.state.phase = Phase::Validating,
            (Phase::Validating, SessionEvent::Accepted) => self.state.phase = Phase::Downloading,
            (Phase::Validating, SessionEvent::Rejected(error)) => {
                self.state.phase = Phase::Error;
                self.state.last_error = Some(error);
            }
            (Phase::Downloading, SessionEvent::Resolved) => self.state.phase = Phase::Ready,
            (Phase::Downloading, SessionEvent::FetchFailed(error))
            | (Phase::Rendering, SessionEvent::SceneFailed(error)) => self.fail(error),
            (Phase::Ready, SessionEvent::Mounted) => self.state.phase = Phase::Rendering,
            (Phase::Rendering, SessionEvent::LoadCompleted) => self.state.error_count = 0,
            (Phase::Error, SessionEvent::Rescan) => self.state.phase = Phase::Scanning,
            (phase, _) => {
                return Err(TransitionError::Illegal { phase, event: name });
            }
        }

        tracing::debug!(%from, to = %self.state.phase, event = name, errors = self.state.error_count, "session transition");
        Ok(self.state.phase)
    }

    /// Back to a fresh `Scanning` state.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    fn fail(&mut self, error: SessionError) {
        if error.kind.counts_toward_budget() {
            self.state.error_count += 1;
        }
        self.state.last_error = Some(error);
        self.state.phase = Phase::Error;

        if self.state.error_count >= self.max_errors {
            tracing::info!(errors = self.state.error_count, "error budget exhausted, rescanning");
            self.state.phase = Phase::Scanning;
            self.state.error_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn download_error() -> SessionError {
        SessionError::new(ErrorKind::DownloadFailure, "connection reset")
    }

    fn to_rendering(machine: &mut SessionMachine) {
        for event in [
            SessionEvent::Scan,
            SessionEvent::Accepted,
            SessionEvent::Resolved,
            SessionEvent::Mounted,
        ] {
            machine.apply(event).unwrap();
        }
    }

    #[test]
    fn test_happy_path() {
        let mut machine = SessionMachine::default();
        assert_eq!(machine.apply(SessionEvent::Scan).unwrap(), Phase::Validating);
        assert_eq!(machine.apply(SessionEvent::Accepted).unwrap(), Phase::Downloading);
        assert_eq!(machine.apply(SessionEvent::Resolved).unwrap(), Phase::Ready);
        assert_eq!(machine.apply(SessionEvent::Mounted).unwrap(), Phase::Rendering);
        assert_eq!(machine.apply(SessionEvent::LoadCompleted).unwrap(), Phase::Rendering);
        assert_eq!(machine.state().error_count, 0);
    }

    #[test]
    fn test_rejection_does_not_count() {
        let mut machine = SessionMachine::default();
        machine.apply(SessionEvent::Scan).unwrap();
        let error = SessionError::new(ErrorKind::InvalidQrFormat, "not a URL");
        assert_eq!(machine.apply(SessionEvent::Rejected(error.clone())).unwrap(), Phase::Error);
        assert_eq!(machine.state().error_count, 0);
        assert_eq!(machine.state().last_error, Some(error));
        assert_eq!(machine.apply(SessionEvent::Rescan).unwrap(), Phase::Scanning);
    }

    #[test]
    fn test_illegal_event_leaves_state() {
        let mut machine = SessionMachine::default();
        let before = machine.state().clone();
        let err = machine.apply(SessionEvent::Resolved).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal {
                phase: Phase::Scanning,
                event: "resolved",
            }
        );
        assert_eq!(machine.state(), &before);

        machine.apply(SessionEvent::Scan).unwrap();
        // a second payload while validating is dropped
        assert!(machine.apply(SessionEvent::Scan).is_err());
        assert_eq!(machine.phase(), Phase::Validating);
    }

    #[test]
    fn test_budget_forces_scanning() {
        let mut machine = SessionMachine::default();
        for attempt in 1..=MAX_ERRORS {
            machine.apply(SessionEvent::Scan).unwrap();
            machine.apply(SessionEvent::Accepted).unwrap();
            let phase = machine.apply(SessionEvent::FetchFailed(download_error())).unwrap();
            if attempt < MAX_ERRORS {
                assert_eq!(phase, Phase::Error);
                assert_eq!(machine.state().error_count, attempt);
                machine.apply(SessionEvent::Rescan).unwrap();
            } else {
                assert_eq!(phase, Phase::Scanning);
                assert_eq!(machine.state().error_count, 0);
            }
        }
    }

    #[test]
    fn test_load_success_resets_count() {
        let mut machine = SessionMachine::default();
        machine.apply(SessionEvent::Scan).unwrap();
        machine.apply(SessionEvent::Accepted).unwrap();
        machine.apply(SessionEvent::FetchFailed(download_error())).unwrap();
        machine.apply(SessionEvent::Rescan).unwrap();
        to_rendering(&mut machine);
        assert_eq!(machine.state().error_count, 1);

        machine.apply(SessionEvent::LoadCompleted).unwrap();
        assert_eq!(machine.state().error_count, 0);
    }

    #[test]
    fn test_scene_failures_count() {
        let mut machine = SessionMachine::new(2);
        to_rendering(&mut machine);
        let error = SessionError::new(ErrorKind::MarkerNotAcquired, "no marker");
        assert_eq!(machine.apply(SessionEvent::SceneFailed(error.clone())).unwrap(), Phase::Error);
        machine.apply(SessionEvent::Rescan).unwrap();
        to_rendering(&mut machine);
        assert_eq!(machine.apply(SessionEvent::SceneFailed(error)).unwrap(), Phase::Scanning);
    }

    #[test]
    fn test_reset() {
        let mut machine = SessionMachine::default();
        to_rendering(&mut machine);
        machine.reset();
        assert_eq!(machine.state(), &SessionState::default());
    }
}
