//! Error types for the session layer.

use crate::SessionState;

/// Errors that can occur while mutating the matchmaking session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A spawn attempt is already in flight. Starting a second one would
    /// risk spawning two rooms for one user action.
    #[error("a spawn attempt is already pending (state: {0})")]
    AttemptPending(SessionState),

    /// The requested state change is not a valid transition.
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
}
