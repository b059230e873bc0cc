//! Wire protocol for Matchlink.
//!
//! This crate defines the language a client speaks with the master/allocator
//! service that provisions game-room processes:
//!
//! - **Types** ([`SpawnerRequest`], [`SpawnerEvent`], [`SpawnStatus`],
//!   [`SpawnOptions`], [`GameInfo`], …) — the structures that travel on
//!   the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the spawner
//! client (request/reply bookkeeping). It knows nothing about connections,
//! timers, or sessions, only message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (SpawnerRequest / SpawnerEvent) → Spawn client
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    GameInfo, OptionMap, Region, RoomId, SpawnOptions, SpawnStatus,
    SpawnTaskId, SpawnerRequest, SpawnerEvent,
};
