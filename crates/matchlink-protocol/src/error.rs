//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding spawner messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed input, missing fields, or a
    /// message shape this protocol version doesn't know.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates a protocol rule (e.g. a status
    /// update for a task id that was never issued).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
