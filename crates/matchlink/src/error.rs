//! Unified error type for the Matchlink stack.

use matchlink_protocol::ProtocolError;
use matchlink_session::SessionError;
use matchlink_spawn::SpawnError;
use matchlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes let `?` convert sub-crate errors
/// automatically, so code built on the meta crate deals with one type.
///
/// Note that the orchestrator converts *orchestration* failures (rejected
/// requests, deadlines, scene-load errors) into [`MatchEvent`]s instead of
/// returning them; what does come back as `MatchlinkError` are caller
/// errors such as starting a second attempt while one is pending.
///
/// [`MatchEvent`]: crate::MatchEvent
#[derive(Debug, thiserror::Error)]
pub enum MatchlinkError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A spawn-level error (rejected request, lost connection).
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A session-level error (attempt pending, invalid transition).
    #[error(transparent)]
    Session(#[from] SessionError),
}
