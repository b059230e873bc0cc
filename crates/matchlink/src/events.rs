//! Lifecycle events published by the orchestrator.

/// Fire-and-forget notifications for the user-facing layer.
///
/// Subscribers register via
/// [`MatchJoinOrchestrator::subscribe`](crate::MatchJoinOrchestrator::subscribe)
/// *before* starting an attempt; events are broadcast and never block the
/// orchestration. Failures at the orchestration boundary arrive here as
/// [`MatchEvent::Error`]; they are never raised as errors into UI code.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// Show (or update) a loading indicator with the given message.
    /// Repeated emissions replace the previous message, which is how
    /// scene-load progress percentages arrive.
    LoadingStarted(String),

    /// Hide the loading indicator.
    LoadingFinished,

    /// Something went wrong; show the message to the player.
    Error(String),

    /// A room was spawned and finalized for this client.
    RoomStarted,

    /// The spawn attempt was given up (request error or deadline).
    RoomStartAborted,
}
