//! The match-join orchestrator: request a spawn, wait for finalize, move
//! the client into the room.
//!
//! One orchestrator owns one [`MatchmakingSession`] and one
//! [`SpawnerClient`]. All UI-facing output goes through the broadcast
//! event channel; all failures at this boundary become events, never
//! errors crossing into UI code.

use matchlink_protocol::{
    Codec, GameInfo, OptionMap, Region, SpawnOptions,
};
use matchlink_session::{
    AttemptOutcome, MatchmakingConfig, MatchmakingSession,
};
use matchlink_spawn::{SpawnerClient, WaitTimedOut, wait_until_finalized};
use matchlink_transport::Connection;
use tokio::sync::{broadcast, mpsc};

use crate::{MatchEvent, MatchlinkError, PasswordPrompt, SceneLoader};

/// Private option marking a spawn as client-initiated; forwarded only to
/// the spawned room process, which uses it to auto-connect back.
const START_CLIENT_CONNECTION: &str = "start-client-connection";

/// Capacity of the event broadcast channel. Slow subscribers lag and skip
/// rather than block the orchestration.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Drives the sequence "request spawn → wait for finalize → transition
/// into the room".
///
/// Not reentrant: a second [`create_new_room`](Self::create_new_room)
/// while one is pending is rejected, so one user action can never spawn
/// two rooms. Room metadata arrives via a separate server message in the
/// surrounding system, which is why [`start_match`](Self::start_match) is
/// its own entry point rather than being chained automatically.
pub struct MatchJoinOrchestrator<C, D, S, P>
where
    C: Connection,
    D: Codec,
    S: SceneLoader,
    P: PasswordPrompt,
{
    spawner: SpawnerClient<C, D>,
    config: MatchmakingConfig,
    session: MatchmakingSession,
    events: broadcast::Sender<MatchEvent>,
    scene_loader: S,
    password_prompt: P,
}

impl<C, D, S, P> MatchJoinOrchestrator<C, D, S, P>
where
    C: Connection,
    D: Codec,
    S: SceneLoader,
    P: PasswordPrompt,
{
    /// Creates an orchestrator over an existing spawner client.
    pub fn new(
        spawner: SpawnerClient<C, D>,
        config: MatchmakingConfig,
        scene_loader: S,
        password_prompt: P,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            spawner,
            config: config.validated(),
            session: MatchmakingSession::new(),
            events,
            scene_loader,
            password_prompt,
        }
    }

    /// Subscribes to lifecycle events. Subscribe before calling
    /// [`create_new_room`](Self::create_new_room); events are not
    /// replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    /// Read access to the session record.
    pub fn session(&self) -> &MatchmakingSession {
        &self.session
    }

    /// Forces the session back to Idle after an externally cancelled
    /// attempt (the `create_new_room` future was dropped mid-flight).
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Requests a new room from the allocator and waits for it to
    /// finalize, bounded by the configured `match_creation_timeout`.
    ///
    /// An empty region is "any region", letting the allocator pick.
    /// Orchestration
    /// failures (rejected request, deadline exceeded) are reported as
    /// events and summarized in the returned [`AttemptOutcome`]; the only
    /// error a caller sees is
    /// [`SessionError::AttemptPending`](matchlink_session::SessionError::AttemptPending)
    /// for an overlapping call.
    pub async fn create_new_room(
        &mut self,
        region: Region,
        options: OptionMap,
    ) -> Result<AttemptOutcome, MatchlinkError> {
        self.session.begin_attempt()?;

        self.emit(MatchEvent::LoadingStarted(
            "Starting room... Please wait!".into(),
        ));
        tracing::debug!(%region, "requesting new room");

        // Options handed to the room process directly, invisible to the
        // allocator's listing APIs.
        let mut custom = OptionMap::new();
        custom.set_flag(START_CLIENT_CONNECTION);
        let spawn_options = SpawnOptions::new(options).with_private(custom);

        let mut handle =
            match self.spawner.request_spawn(spawn_options, region).await {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(error = %e, "spawn request failed");
                    self.emit(MatchEvent::LoadingFinished);
                    self.emit(MatchEvent::Error(e.to_string()));
                    self.session.abort_attempt()?;
                    return Ok(AttemptOutcome::Aborted);
                }
            };

        self.session.task_accepted(handle.task_id())?;
        self.emit(MatchEvent::LoadingStarted(
            "Room started. Finalizing... Please wait!".into(),
        ));

        let wait = wait_until_finalized(
            &mut handle,
            self.config.match_creation_timeout,
        )
        .await;
        self.emit(MatchEvent::LoadingFinished);

        match wait {
            Ok(_) => {
                self.session.complete_attempt()?;
                self.emit(MatchEvent::RoomStarted);
                tracing::info!(
                    task_id = %handle.task_id(),
                    "new room spawned"
                );
                Ok(AttemptOutcome::Started)
            }
            Err(WaitTimedOut) => {
                // Best-effort cleanup of the remote task; its own failure
                // is logged inside abort_spawn and never surfaced.
                self.spawner.abort_spawn(handle.task_id()).await;

                tracing::error!(
                    task_id = %handle.task_id(),
                    "failed to spawn new room: time is up"
                );
                self.emit(MatchEvent::Error(
                    "Failed to spawn new room. Time is up!".into(),
                ));
                self.emit(MatchEvent::RoomStartAborted);
                self.session.abort_attempt()?;
                Ok(AttemptOutcome::Aborted)
            }
        }
    }

    /// Moves the client into a room whose metadata just arrived.
    ///
    /// Password-protected rooms suspend here until the
    /// [`PasswordPrompt`] resolves; a cancelled prompt abandons the join
    /// without loading anything.
    pub async fn start_match(
        &mut self,
        game_info: GameInfo,
    ) -> Result<(), MatchlinkError> {
        self.session
            .set_room(game_info.room_id.clone(), game_info.max_players);

        if game_info.password_protected {
            let confirmed = self
                .password_prompt
                .request(
                    "Room is required the password. \
                     Please enter room password below",
                )
                .await;
            if !confirmed {
                tracing::info!(
                    room_id = %game_info.room_id,
                    "password prompt cancelled, join abandoned"
                );
                return Ok(());
            }
        }

        self.load_game_scene().await
    }

    /// Loads the configured room scene, forwarding progress as loading
    /// messages.
    async fn load_game_scene(&mut self) -> Result<(), MatchlinkError> {
        let scene = self.config.start_room_scene.clone();
        tracing::debug!(%scene, "loading game scene");

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let result = {
            let load = self.scene_loader.load(&scene, progress_tx);
            tokio::pin!(load);

            loop {
                tokio::select! {
                    Some(fraction) = progress_rx.recv() => {
                        self.emit_progress(fraction);
                    }
                    result = &mut load => break result,
                }
            }
        };
        // Progress reported just before completion may still be queued.
        while let Ok(fraction) = progress_rx.try_recv() {
            self.emit_progress(fraction);
        }

        match result {
            Ok(()) => {
                self.session.mark_joined()?;
                self.emit(MatchEvent::LoadingFinished);
                tracing::info!(%scene, "scene loaded, match started");
                Ok(())
            }
            Err(e) => {
                tracing::error!(%scene, error = %e, "scene load failed");
                self.emit(MatchEvent::LoadingFinished);
                self.emit(MatchEvent::Error(e.to_string()));
                Ok(())
            }
        }
    }

    fn emit_progress(&self, fraction: f32) {
        let percent = (fraction * 100.0).round() as u32;
        self.emit(MatchEvent::LoadingStarted(format!(
            "Loading scene {percent}% ... Please wait!"
        )));
    }

    /// Publishes an event; nobody listening is fine.
    fn emit(&self, event: MatchEvent) {
        let _ = self.events.send(event);
    }
}
