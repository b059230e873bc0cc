//! # Matchlink
//!
//! Client-side matchmaking orchestration for master-server style game
//! backends: ask a remote allocator to spawn a room process, wait for it to
//! finalize under a hard deadline, then move the local client into the room.
//!
//! The heart of the crate is [`MatchJoinOrchestrator`]:
//!
//! ```text
//! create_new_room ──→ allocator accepts ──→ finalize wait ──→ RoomStarted
//!        │                    │                   │
//!        │                 rejected            deadline
//!        │                    │                   │ (best-effort abort)
//!        └──── events ←───────┴──→ RoomStartAborted
//!
//! start_match(game_info) ──→ [password prompt] ──→ scene load ──→ Joined
//! ```
//!
//! UI concerns stay outside: the orchestrator publishes [`MatchEvent`]s on a
//! broadcast channel and calls the [`SceneLoader`] / [`PasswordPrompt`]
//! collaborator traits at the seams.

mod error;
mod events;
mod hooks;
mod orchestrator;

pub use error::MatchlinkError;
pub use events::MatchEvent;
pub use hooks::{PasswordPrompt, SceneLoadError, SceneLoader};
pub use orchestrator::MatchJoinOrchestrator;

/// Common imports for applications using Matchlink.
pub mod prelude {
    pub use crate::{
        MatchEvent, MatchJoinOrchestrator, MatchlinkError, PasswordPrompt,
        SceneLoadError, SceneLoader,
    };
    pub use matchlink_protocol::{
        Codec, GameInfo, JsonCodec, OptionMap, Region, RoomId,
        SpawnOptions, SpawnStatus, SpawnTaskId,
    };
    pub use matchlink_session::{
        AttemptOutcome, MatchmakingConfig, MatchmakingSession, SessionState,
    };
    pub use matchlink_spawn::{SpawnError, SpawnHandle, SpawnerClient};
    pub use matchlink_transport::Connection;
}
