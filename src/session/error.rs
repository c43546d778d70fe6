use std::fmt;

use super::state::SessionPhase;

/// Programming errors in driving a session. Load failures never surface
/// here; they degrade the session to not-preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidTransition {
        from: SessionPhase,
        action: &'static str,
    },
    /// `observe` needs a tokio runtime to spawn the load chain on.
    NoRuntime,
    LockPoisoned(&'static str),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { from, action } => {
                write!(f, "invalid session transition: {} while {}", action, from)
            }
            SessionError::NoRuntime => write!(f, "no tokio runtime to spawn the preview load on"),
            SessionError::LockPoisoned(operation) => {
                write!(f, "session lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for SessionError {}
