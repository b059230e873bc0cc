//! The session state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a matchmaking attempt.
///
/// ```text
///            ┌────────────→ Joined ──→ Idle
///            │ (start_match)
/// Idle ──→ Requesting ──→ Finalizing ──→ Idle   (room spawned, cleared)
///               │              │
///               └──→ Aborted ←─┘
///                       │
///                       └──→ Idle
/// ```
///
/// - **Idle**: no pending attempt. `Joined` is entered from here because
///   room metadata arrives via a separate server message after the spawn
///   attempt has already completed and cleared.
/// - **Requesting**: a spawn request is in flight to the allocator.
/// - **Finalizing**: the allocator accepted; waiting for the room process
///   to come up, bounded by the configured deadline.
/// - **Joined**: the client has loaded into a room.
/// - **Aborted**: the attempt failed (request error or deadline); cleared
///   back to Idle once the failure has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Requesting,
    Finalizing,
    Joined,
    Aborted,
}

impl SessionState {
    /// Returns `true` while a spawn attempt is in flight.
    ///
    /// A pending session must reject a second `create_new_room`: one user
    /// action never spawns two rooms.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Requesting | Self::Finalizing)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Requesting)
                | (Self::Idle, Self::Joined)
                | (Self::Requesting, Self::Finalizing)
                | (Self::Requesting, Self::Aborted)
                | (Self::Finalizing, Self::Idle)
                | (Self::Finalizing, Self::Aborted)
                | (Self::Joined, Self::Idle)
                | (Self::Aborted, Self::Idle)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Requesting => write!(f, "Requesting"),
            Self::Finalizing => write!(f, "Finalizing"),
            Self::Joined => write!(f, "Joined"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}
