//! Collaborator traits for the surrounding application.
//!
//! The orchestrator does not render scenes or draw dialogs. Whatever does
//! (a game engine binding, a TUI, a test double) implements these traits
//! and is handed to [`MatchJoinOrchestrator::new`](crate::MatchJoinOrchestrator::new).

use tokio::sync::mpsc;

/// Loading the destination scene failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("scene load failed: {0}")]
pub struct SceneLoadError(pub String);

/// Loads the destination scene/room.
///
/// Returns an explicitly `Send` future (instead of plain `async fn`) so
/// orchestrations that call it can themselves run inside spawned tasks.
pub trait SceneLoader: Send + Sync + 'static {
    /// Loads `scene`, reporting fractional progress in `[0, 1]` on
    /// `progress` zero or more times before resolving exactly once.
    ///
    /// The orchestrator forwards progress to subscribers as percentage
    /// loading messages; the sender can simply be dropped if the loader
    /// has no progress to report.
    fn load(
        &self,
        scene: &str,
        progress: mpsc::UnboundedSender<f32>,
    ) -> impl Future<Output = Result<(), SceneLoadError>> + Send;
}

/// Asks the player for a room password.
///
/// The prompt is the continuation: the join is suspended until the returned
/// future resolves. Resolving `true` continues into the scene load,
/// `false` abandons the join (a cancelled dialog is a user decision, not an
/// error).
pub trait PasswordPrompt: Send + Sync + 'static {
    fn request(&self, message: &str) -> impl Future<Output = bool> + Send;
}
