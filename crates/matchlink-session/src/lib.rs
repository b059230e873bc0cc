//! Matchmaking session state for Matchlink.
//!
//! A session is the client's in-memory record of the currently pending (or
//! most recently completed) matchmaking attempt. There is at most one
//! pending attempt per session, and exactly one session per orchestrator:
//! the session is a plain owned value, not a process-wide singleton.
//!
//! # Key types
//!
//! - [`MatchmakingConfig`] — scene name + finalize deadline
//! - [`SessionState`] — the attempt lifecycle state machine
//! - [`MatchmakingSession`] — the owned session record

mod config;
mod error;
mod session;
mod state;

pub use config::MatchmakingConfig;
pub use error::SessionError;
pub use session::{AttemptOutcome, MatchmakingSession};
pub use state::SessionState;
