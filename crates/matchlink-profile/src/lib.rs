//! Player-profile persistence for Matchlink.
//!
//! The matchmaking core does not read or write profiles itself; the
//! surrounding application syncs a profile blob around session bootstrap.
//! This crate is that boundary: a keyed store with exactly two operations,
//! find-or-create and upsert.
//!
//! Profiles are opaque byte blobs keyed by a unique username. Two backends
//! are provided: [`SqliteProfileStore`] for real deployments and
//! [`MemoryProfileStore`] for tests.
//!
//! # Known limitation
//!
//! `find_or_create` followed by a later `update` is not transactional
//! across the two calls. Two processes bootstrapping the same username can
//! interleave: last update wins. Single-process use (the normal client
//! setup) is unaffected.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod sqlite;
mod store;

pub use error::ProfileError;
pub use memory::MemoryProfileStore;
pub use sqlite::SqliteProfileStore;
pub use store::{ProfileRecord, ProfileStore, restore_or_default};
