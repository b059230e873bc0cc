//! Core types for the spawner wire protocol.
//!
//! Everything in this module is either sent to the allocator, received from
//! it, or describes a spawn task's lifecycle. The message enums use serde's
//! internally-tagged representation so the JSON carries a `"type"` field,
//! which keeps the wire format easy to inspect and to implement from other
//! languages.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier the allocator assigns to an accepted spawn request.
///
/// Unique per request for the lifetime of the allocator connection. Used to
/// correlate status updates and to address abort requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnTaskId(pub u64);

impl fmt::Display for SpawnTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Identifier of a provisioned room, as issued by the server.
///
/// Opaque string; the allocator side decides the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Spawn lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of a spawn task on the allocator side.
///
/// ```text
/// Queued → Processing → Finalized
///              │
///              ├──→ Aborted   (explicit abort)
///              └──→ TimedOut  (allocator gave up)
/// ```
///
/// `Finalized` means the room process is up and joinable. `Aborted` and
/// `TimedOut` are the allocator's terminal failure states; the client's own
/// finalize-wait deadline is tracked locally and is independent of them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum SpawnStatus {
    /// Request accepted, waiting for a spawner machine to pick it up.
    #[default]
    Queued,
    /// A spawner is starting the room process.
    Processing,
    /// The room process is up and joinable.
    Finalized,
    /// The task was cancelled before finalizing.
    Aborted,
    /// The allocator gave up on the task.
    TimedOut,
}

impl SpawnStatus {
    /// Returns `true` once the task can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Aborted | Self::TimedOut)
    }

    /// Returns `true` if the room is up and joinable.
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}

impl fmt::Display for SpawnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "Queued",
            Self::Processing => "Processing",
            Self::Finalized => "Finalized",
            Self::Aborted => "Aborted",
            Self::TimedOut => "TimedOut",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Ordered string key-value pairs.
///
/// Insertion order is preserved on the wire; setting an existing key
/// overwrites its value in place. Flags are keys with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionMap(Vec<(String, String)>);

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, overwriting in place if the key exists.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl ToString,
    ) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    /// Sets a valueless flag option.
    pub fn set_flag(&mut self, key: impl Into<String>) -> &mut Self {
        self.set(key, "")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for OptionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

/// Options attached to a spawn request, split into two disjoint sets.
///
/// `public` options are visible to the allocator and to anyone browsing the
/// room listing (region, capacity, …). `private` options are forwarded only
/// to the spawned room process and MUST never appear in listing/discovery
/// payloads: [`SpawnerRequest::RequestSpawn`] is the only message that
/// carries them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnOptions {
    pub public: OptionMap,
    pub private: OptionMap,
}

impl SpawnOptions {
    pub fn new(public: OptionMap) -> Self {
        Self {
            public,
            private: OptionMap::new(),
        }
    }

    pub fn with_private(mut self, private: OptionMap) -> Self {
        self.private = private;
        self
    }
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Region hint for the allocator.
///
/// An empty region name means "any region", letting the allocator pick. This
/// mirrors the master-server convention where clients pass an empty string
/// to opt out of region pinning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// A region preference that lets the allocator pick.
    pub fn any() -> Self {
        Self(String::new())
    }

    /// Creates a region from a name. Empty names normalize to [`Region::any`].
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "any")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// GameInfo
// ---------------------------------------------------------------------------

/// Metadata of a provisioned room, received from the server when the room
/// becomes available. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    /// The room's identifier.
    pub room_id: RoomId,
    /// Maximum player count configured for the room.
    pub max_players: usize,
    /// Whether joining requires a password.
    pub password_protected: bool,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the allocator.
///
/// `seq` is a client-assigned correlation number: the allocator echoes it in
/// the accepted/rejected reply so a client can run several requests on one
/// connection without guessing which reply belongs to which request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpawnerRequest {
    /// Ask the allocator to start a new room process.
    RequestSpawn {
        seq: u64,
        /// Options visible to the allocator (region, capacity, …).
        options: OptionMap,
        /// Options forwarded only to the spawned process.
        custom_options: OptionMap,
        region: Region,
    },

    /// Cancel an in-flight (or already-finalized) spawn task.
    /// Fire-and-forget; the allocator may answer with
    /// [`SpawnerEvent::AbortAck`] or stay silent.
    AbortSpawn { task_id: SpawnTaskId },
}

/// Messages the allocator sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpawnerEvent {
    /// The spawn request was accepted; a task now exists.
    SpawnAccepted { seq: u64, task_id: SpawnTaskId },

    /// The spawn request was refused outright.
    /// `code` follows HTTP-style conventions (429 = quota exceeded,
    /// 503 = no spawner available, …).
    SpawnRejected {
        seq: u64,
        code: u16,
        message: String,
    },

    /// A task moved to a new lifecycle status.
    StatusChanged {
        task_id: SpawnTaskId,
        status: SpawnStatus,
    },

    /// Acknowledgement of an abort request. Informational only.
    AbortAck { task_id: SpawnTaskId },
}

// =========================================================================
// Tests
// =========================================================================
