//! Matchmaking configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the match-join flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingConfig {
    /// Scene/room destination loaded after a match is successfully
    /// created.
    pub start_room_scene: String,

    /// How long to wait for a spawn task to finalize before the attempt
    /// is aborted.
    pub match_creation_timeout: Duration,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            start_room_scene: "Room".to_string(),
            match_creation_timeout: Duration::from_secs(60),
        }
    }
}

impl MatchmakingConfig {
    /// Fixes any unusable values so the config is safe to use.
    ///
    /// Rules:
    /// - An empty `start_room_scene` falls back to the default name.
    /// - `match_creation_timeout` is left as-is: zero is a valid
    ///   (if unforgiving) deadline.
    pub fn validated(mut self) -> Self {
        if self.start_room_scene.is_empty() {
            tracing::warn!(
                "start_room_scene is empty, falling back to \"Room\""
            );
            self.start_room_scene = "Room".to_string();
        }
        self
    }
}
