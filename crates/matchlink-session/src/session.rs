//! The matchmaking session: one pending attempt at a time.

use matchlink_protocol::{RoomId, SpawnTaskId};

use crate::{SessionError, SessionState};

/// How the most recent spawn attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The room was spawned and finalized.
    Started,
    /// The attempt was aborted (request error or deadline).
    Aborted,
}

/// The client's record of the current matchmaking attempt.
///
/// Exclusively owned by one orchestrator instance. Not a singleton and not
/// thread-safe on its own: "one active session at a time" comes from the
/// ownership discipline, not from hidden global state.
#[derive(Debug)]
pub struct MatchmakingSession {
    state: SessionState,
    /// Task id of the in-flight spawn, if the allocator accepted one.
    pending_task: Option<SpawnTaskId>,
    /// Room metadata recorded by `start_match`.
    room_id: Option<RoomId>,
    max_players: Option<usize>,
    last_outcome: Option<AttemptOutcome>,
}

impl MatchmakingSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            pending_task: None,
            room_id: None,
            max_players: None,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_task(&self) -> Option<SpawnTaskId> {
        self.pending_task
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn max_players(&self) -> Option<usize> {
        self.max_players
    }

    pub fn last_outcome(&self) -> Option<AttemptOutcome> {
        self.last_outcome
    }

    /// Starts a new spawn attempt.
    ///
    /// A completed session (`Joined`/`Aborted` left over from an earlier
    /// attempt) is cleared first; a pending one is rejected.
    ///
    /// # Errors
    /// Returns [`SessionError::AttemptPending`] while a previous attempt
    /// is still `Requesting` or `Finalizing`.
    pub fn begin_attempt(&mut self) -> Result<(), SessionError> {
        if self.state.is_pending() {
            return Err(SessionError::AttemptPending(self.state));
        }
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle)?;
        }
        self.transition(SessionState::Requesting)?;
        self.pending_task = None;
        Ok(())
    }

    /// Records the allocator's acceptance: the attempt is now finalizing.
    pub fn task_accepted(
        &mut self,
        task_id: SpawnTaskId,
    ) -> Result<(), SessionError> {
        self.transition(SessionState::Finalizing)?;
        self.pending_task = Some(task_id);
        Ok(())
    }

    /// Completes a successful attempt: the session clears back to Idle so
    /// the caller can `start_match` once room metadata arrives.
    pub fn complete_attempt(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Idle)?;
        self.pending_task = None;
        self.last_outcome = Some(AttemptOutcome::Started);
        Ok(())
    }

    /// Aborts a pending attempt and clears the session.
    pub fn abort_attempt(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Aborted)?;
        self.transition(SessionState::Idle)?;
        self.pending_task = None;
        self.last_outcome = Some(AttemptOutcome::Aborted);
        Ok(())
    }

    /// Records room metadata from a `GameInfo` message.
    pub fn set_room(&mut self, room_id: RoomId, max_players: usize) {
        tracing::debug!(%room_id, max_players, "room metadata recorded");
        self.room_id = Some(room_id);
        self.max_players = Some(max_players);
    }

    /// Marks the client as joined into a room (scene load finished).
    pub fn mark_joined(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Aborted {
            self.transition(SessionState::Idle)?;
        }
        self.transition(SessionState::Joined)
    }

    /// Forces the session back to Idle.
    ///
    /// Escape hatch for external cancellation: a dropped orchestration
    /// future leaves the session pending, and the owner decides when that
    /// attempt is truly dead.
    pub fn reset(&mut self) {
        if self.state != SessionState::Idle {
            tracing::warn!(from = %self.state, "session force-reset to Idle");
        }
        self.state = SessionState::Idle;
        self.pending_task = None;
    }

    fn transition(
        &mut self,
        to: SessionState,
    ) -> Result<(), SessionError> {
        if !self.state.can_transition_to(to) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = %self.state, %to, "session transition");
        self.state = to;
        Ok(())
    }
}

impl Default for MatchmakingSession {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
