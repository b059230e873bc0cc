//! Error types for the spawn layer.

use matchlink_protocol::ProtocolError;

/// Errors that can occur while requesting a spawn.
///
/// Note what is *not* here: abort failures. Aborts are best-effort cleanup
/// after the orchestration has already failed, so
/// [`SpawnerClient::abort_spawn`](crate::SpawnerClient::abort_spawn) logs
/// and swallows its own errors instead of surfacing them.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The allocator refused the request (quota exceeded, no spawner
    /// available, malformed options, …).
    #[error("spawn request rejected by allocator ({code}): {message}")]
    Rejected { code: u16, message: String },

    /// The allocator connection died before a reply arrived.
    #[error("allocator connection lost: {0}")]
    ConnectionLost(String),

    /// Encoding the request failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
