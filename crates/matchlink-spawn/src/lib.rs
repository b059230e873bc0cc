//! Spawner client for Matchlink.
//!
//! This crate talks to the allocator: it sends spawn requests, tracks each
//! accepted task's status as the allocator pushes updates, and provides the
//! bounded wait the orchestrator uses to decide "room is up" vs "give up".
//!
//! # Key types
//!
//! - [`SpawnerClient`] — request/abort API over one allocator connection
//! - [`SpawnHandle`] — task id + live status accessor for one spawn task
//! - [`wait_until_finalized`] — hard-deadline wait on a handle
//!
//! # How it fits in the stack
//!
//! ```text
//! Orchestrator (above)  ← calls request_spawn / wait / abort_spawn
//!     ↕
//! Spawn layer (this crate)  ← correlation, status routing, deadlines
//!     ↕
//! Protocol + Transport (below)  ← message shapes, bytes on the wire
//! ```

mod client;
mod error;
mod handle;
mod wait;

pub use client::SpawnerClient;
pub use error::SpawnError;
pub use handle::SpawnHandle;
pub use wait::{WaitTimedOut, wait_until, wait_until_finalized};
