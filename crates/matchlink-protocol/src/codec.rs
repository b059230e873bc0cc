//! Codec trait and implementations for the spawner wire format.
//!
//! The spawner client never serializes messages directly: it goes through
//! a [`Codec`] so the wire representation can be swapped without touching
//! request/reply bookkeeping. [`JsonCodec`] is the default and is what the
//! reference allocator speaks; a binary codec can be added behind its own
//! feature flag later without changing any caller.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts protocol values to and from bytes.
///
/// `Send + Sync + 'static` because the codec is shared with the spawner
/// client's background read task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] on malformed, truncated, or
    /// wrongly-shaped input.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON via `serde_json`.
///
/// Human-readable, so allocator traffic can be read straight out of logs
/// and packet captures while developing.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
