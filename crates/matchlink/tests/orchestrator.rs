//! Integration tests for the match-join orchestrator.
//!
//! The whole stack runs in-process: the orchestrator's spawner client sits
//! on one end of a memory connection pair and a scripted allocator plays
//! the other end. Time-sensitive scenarios run on the paused Tokio clock,
//! so deadlines are exact and the tests finish instantly in wall time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use matchlink::prelude::*;
use matchlink_protocol::{SpawnerEvent, SpawnerRequest};
use matchlink_transport::{MemoryConnection, memory};
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::{self, Instant};

// =========================================================================
// Scripted allocator
// =========================================================================

/// How the allocator reacts to a spawn request.
#[derive(Clone)]
enum Script {
    /// Accept, push Processing, then Finalized after the delay.
    FinalizeAfter(Duration),
    /// Accept, push Processing, never finalize.
    NeverFinalize,
    /// Refuse the request outright.
    Reject { code: u16, message: String },
}

/// Shared recordings of everything the allocator saw.
#[derive(Clone, Default)]
struct AllocatorLog {
    requests: Arc<Mutex<Vec<SpawnerRequest>>>,
    aborts: Arc<Mutex<Vec<SpawnTaskId>>>,
}

impl AllocatorLog {
    fn requests(&self) -> Vec<SpawnerRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn aborts(&self) -> Vec<SpawnTaskId> {
        self.aborts.lock().unwrap().clone()
    }
}

async fn send_event(conn: &MemoryConnection, event: &SpawnerEvent) {
    let bytes = JsonCodec.encode(event).expect("encode event");
    let _ = conn.send(&bytes).await;
}

/// Runs an allocator on `conn` until the connection closes.
fn spawn_allocator(conn: MemoryConnection, script: Script) -> AllocatorLog {
    let log = AllocatorLog::default();
    let task_log = log.clone();
    let conn = Arc::new(conn);

    tokio::spawn(async move {
        loop {
            let data = match conn.recv().await {
                Ok(Some(data)) => data,
                _ => break,
            };
            let request: SpawnerRequest =
                JsonCodec.decode(&data).expect("decode request");
            task_log.requests.lock().unwrap().push(request.clone());

            match request {
                SpawnerRequest::RequestSpawn { seq, .. } => {
                    let task_id = SpawnTaskId(1);
                    match &script {
                        Script::Reject { code, message } => {
                            send_event(
                                &conn,
                                &SpawnerEvent::SpawnRejected {
                                    seq,
                                    code: *code,
                                    message: message.clone(),
                                },
                            )
                            .await;
                        }
                        Script::NeverFinalize => {
                            send_event(
                                &conn,
                                &SpawnerEvent::SpawnAccepted {
                                    seq,
                                    task_id,
                                },
                            )
                            .await;
                            send_event(
                                &conn,
                                &SpawnerEvent::StatusChanged {
                                    task_id,
                                    status: SpawnStatus::Processing,
                                },
                            )
                            .await;
                        }
                        Script::FinalizeAfter(delay) => {
                            send_event(
                                &conn,
                                &SpawnerEvent::SpawnAccepted {
                                    seq,
                                    task_id,
                                },
                            )
                            .await;
                            send_event(
                                &conn,
                                &SpawnerEvent::StatusChanged {
                                    task_id,
                                    status: SpawnStatus::Processing,
                                },
                            )
                            .await;
                            let conn = Arc::clone(&conn);
                            let delay = *delay;
                            tokio::spawn(async move {
                                time::sleep(delay).await;
                                send_event(
                                    &conn,
                                    &SpawnerEvent::StatusChanged {
                                        task_id,
                                        status: SpawnStatus::Finalized,
                                    },
                                )
                                .await;
                            });
                        }
                    }
                }
                SpawnerRequest::AbortSpawn { task_id } => {
                    task_log.aborts.lock().unwrap().push(task_id);
                    send_event(
                        &conn,
                        &SpawnerEvent::AbortAck { task_id },
                    )
                    .await;
                }
            }
        }
    });

    log
}

// =========================================================================
// Fake collaborators
// =========================================================================

/// Scene loader that records load calls and reports canned progress.
#[derive(Clone)]
struct RecordingSceneLoader {
    loads: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSceneLoader {
    fn new() -> Self {
        Self {
            loads: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            loads: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }
}

impl SceneLoader for RecordingSceneLoader {
    async fn load(
        &self,
        scene: &str,
        progress: mpsc::UnboundedSender<f32>,
    ) -> Result<(), SceneLoadError> {
        let _ = progress.send(0.25);
        let _ = progress.send(1.0);
        self.loads.lock().unwrap().push(scene.to_string());
        if self.fail {
            Err(SceneLoadError("disk error while streaming scene".into()))
        } else {
            Ok(())
        }
    }
}

/// Password prompt that answers immediately.
struct ImmediatePrompt {
    answer: bool,
}

impl PasswordPrompt for ImmediatePrompt {
    async fn request(&self, _message: &str) -> bool {
        self.answer
    }
}

/// Password prompt that suspends until the test releases it.
struct GatedPrompt {
    gate: Arc<Notify>,
    answer: bool,
    shown: Arc<Mutex<Vec<String>>>,
}

impl PasswordPrompt for GatedPrompt {
    async fn request(&self, message: &str) -> bool {
        self.shown.lock().unwrap().push(message.to_string());
        self.gate.notified().await;
        self.answer
    }
}

// =========================================================================
// Harness
// =========================================================================

type TestOrchestrator<P> = MatchJoinOrchestrator<
    MemoryConnection,
    JsonCodec,
    RecordingSceneLoader,
    P,
>;

fn orchestrator_with(
    script: Script,
    config: MatchmakingConfig,
    scene_loader: RecordingSceneLoader,
) -> (TestOrchestrator<ImmediatePrompt>, AllocatorLog) {
    let (client_end, allocator_end) = memory::pair();
    let log = spawn_allocator(allocator_end, script);
    let spawner = SpawnerClient::new(client_end, JsonCodec);
    let orchestrator = MatchJoinOrchestrator::new(
        spawner,
        config,
        scene_loader,
        ImmediatePrompt { answer: true },
    );
    (orchestrator, log)
}

fn capacity_options(capacity: u32) -> OptionMap {
    let mut options = OptionMap::new();
    options.set("capacity", capacity);
    options
}

fn drain(rx: &mut broadcast::Receiver<MatchEvent>) -> Vec<MatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// create_new_room
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_finalizes_before_deadline() {
    let (mut orchestrator, log) = orchestrator_with(
        Script::FinalizeAfter(Duration::from_secs(2)),
        MatchmakingConfig::default(), // 60 s deadline
        RecordingSceneLoader::new(),
    );
    let mut events = orchestrator.subscribe();

    let start = Instant::now();
    let outcome = orchestrator
        .create_new_room(Region::new(""), capacity_options(4))
        .await
        .expect("no caller error");

    assert_eq!(outcome, AttemptOutcome::Started);
    assert!(start.elapsed() >= Duration::from_secs(2));

    let events = drain(&mut events);
    assert!(
        matches!(events.first(), Some(MatchEvent::LoadingStarted(_))),
        "expected a loading notification first, got {events:?}"
    );
    assert!(events.contains(&MatchEvent::LoadingFinished));
    assert_eq!(events.last(), Some(&MatchEvent::RoomStarted));
    assert!(!events.contains(&MatchEvent::RoomStartAborted));

    // No abort traffic on the happy path.
    assert!(log.aborts().is_empty());

    // Session cleared for the follow-up start_match.
    assert_eq!(orchestrator.session().state(), SessionState::Idle);
    assert_eq!(
        orchestrator.session().last_outcome(),
        Some(AttemptOutcome::Started)
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_room_empty_region_reaches_allocator_as_any() {
    let (mut orchestrator, log) = orchestrator_with(
        Script::FinalizeAfter(Duration::from_secs(1)),
        MatchmakingConfig::default(),
        RecordingSceneLoader::new(),
    );

    orchestrator
        .create_new_room(Region::new(""), capacity_options(4))
        .await
        .unwrap();

    let requests = log.requests();
    let SpawnerRequest::RequestSpawn {
        options,
        custom_options,
        region,
        ..
    } = &requests[0]
    else {
        panic!("expected RequestSpawn, got {requests:?}");
    };
    assert!(region.is_any());
    assert_eq!(options.get("capacity"), Some("4"));
    // The client-initiated-start marker rides along privately.
    assert!(custom_options.contains("start-client-connection"));
    assert!(!options.contains("start-client-connection"));
}

#[tokio::test(start_paused = true)]
async fn test_create_room_timeout_aborts_the_task() {
    let config = MatchmakingConfig {
        match_creation_timeout: Duration::from_secs(5),
        ..MatchmakingConfig::default()
    };
    let (mut orchestrator, log) = orchestrator_with(
        Script::NeverFinalize,
        config,
        RecordingSceneLoader::new(),
    );
    let mut events = orchestrator.subscribe();

    let start = Instant::now();
    let outcome = orchestrator
        .create_new_room(Region::any(), capacity_options(4))
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Aborted);
    assert!(
        start.elapsed() >= Duration::from_secs(5),
        "deadline must not fire early"
    );

    // Give the allocator task a moment to process the abort message.
    time::sleep(Duration::from_millis(10)).await;
    // Exactly one best-effort abort for the accepted task.
    assert_eq!(log.aborts(), vec![SpawnTaskId(1)]);

    let events = drain(&mut events);
    assert!(events.contains(&MatchEvent::Error(
        "Failed to spawn new room. Time is up!".into()
    )));
    assert_eq!(events.last(), Some(&MatchEvent::RoomStartAborted));
    assert!(!events.contains(&MatchEvent::RoomStarted));

    assert_eq!(orchestrator.session().state(), SessionState::Idle);
    assert_eq!(
        orchestrator.session().last_outcome(),
        Some(AttemptOutcome::Aborted)
    );
}

#[tokio::test(start_paused = true)]
async fn test_create_room_zero_timeout_times_out_immediately() {
    let config = MatchmakingConfig {
        match_creation_timeout: Duration::ZERO,
        ..MatchmakingConfig::default()
    };
    let (mut orchestrator, log) = orchestrator_with(
        Script::NeverFinalize,
        config,
        RecordingSceneLoader::new(),
    );

    let outcome = orchestrator
        .create_new_room(Region::any(), capacity_options(4))
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Aborted);

    time::sleep(Duration::from_millis(10)).await;
    assert_eq!(log.aborts(), vec![SpawnTaskId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_create_room_rejection_skips_wait_and_abort() {
    let (mut orchestrator, log) = orchestrator_with(
        Script::Reject {
            code: 429,
            message: "spawn quota exceeded".into(),
        },
        MatchmakingConfig::default(),
        RecordingSceneLoader::new(),
    );
    let mut events = orchestrator.subscribe();

    let start = Instant::now();
    let outcome = orchestrator
        .create_new_room(Region::any(), capacity_options(4))
        .await
        .unwrap();

    assert_eq!(outcome, AttemptOutcome::Aborted);
    // No finalize-wait was started: the rejection came straight back.
    assert!(start.elapsed() < Duration::from_secs(1));
    // And no abort call, since there is no task to abort.
    assert!(log.aborts().is_empty());

    let events = drain(&mut events);
    assert!(
        events.iter().any(|e| matches!(
            e,
            MatchEvent::Error(msg) if msg.contains("spawn quota exceeded")
        )),
        "expected the rejection reason in an error event, got {events:?}"
    );
    // Rejection is not an aborted *room start*: the task never existed.
    assert!(!events.contains(&MatchEvent::RoomStartAborted));
}

#[tokio::test(start_paused = true)]
async fn test_second_create_while_pending_is_rejected() {
    let (mut orchestrator, _log) = orchestrator_with(
        Script::NeverFinalize,
        MatchmakingConfig::default(),
        RecordingSceneLoader::new(),
    );
    let mut events = orchestrator.subscribe();

    {
        let first = orchestrator
            .create_new_room(Region::any(), capacity_options(4));
        tokio::pin!(first);

        // Drive the first attempt into its finalize-wait, then drop it
        // (external cancellation mid-flight).
        tokio::select! {
            outcome = &mut first => {
                panic!("attempt should still be waiting, got {outcome:?}")
            }
            _ = time::sleep(Duration::from_secs(1)) => {}
        }
    }

    // The cancelled attempt left the session pending; a second call must
    // refuse rather than spawn a second room for the same user action.
    let result = orchestrator
        .create_new_room(Region::any(), capacity_options(4))
        .await;
    assert!(matches!(
        result,
        Err(MatchlinkError::Session(
            matchlink_session::SessionError::AttemptPending(_)
        ))
    ));

    let events = drain(&mut events);
    let started = events
        .iter()
        .filter(|e| **e == MatchEvent::RoomStarted)
        .count();
    assert_eq!(started, 0, "no room may start from the rejected overlap");

    // The owner decides when the cancelled attempt is dead.
    orchestrator.reset();
    assert_eq!(orchestrator.session().state(), SessionState::Idle);
}

// =========================================================================
// start_match
// =========================================================================

fn plain_room() -> GameInfo {
    GameInfo {
        room_id: RoomId::new("r1"),
        max_players: 8,
        password_protected: false,
    }
}

fn locked_room() -> GameInfo {
    GameInfo {
        room_id: RoomId::new("r1"),
        max_players: 8,
        password_protected: true,
    }
}

#[tokio::test]
async fn test_start_match_loads_configured_scene_once() {
    let config = MatchmakingConfig {
        start_room_scene: "Arena".into(),
        ..MatchmakingConfig::default()
    };
    let loader = RecordingSceneLoader::new();
    let (mut orchestrator, _log) = orchestrator_with(
        Script::NeverFinalize,
        config,
        loader.clone(),
    );
    let mut events = orchestrator.subscribe();

    orchestrator.start_match(plain_room()).await.unwrap();

    assert_eq!(loader.loads(), vec!["Arena".to_string()]);
    assert_eq!(orchestrator.session().state(), SessionState::Joined);
    assert_eq!(
        orchestrator.session().room_id(),
        Some(&RoomId::new("r1"))
    );
    assert_eq!(orchestrator.session().max_players(), Some(8));

    // Progress fractions surface as percentage loading messages.
    let events = drain(&mut events);
    assert!(events.contains(&MatchEvent::LoadingStarted(
        "Loading scene 25% ... Please wait!".into()
    )));
    assert!(events.contains(&MatchEvent::LoadingStarted(
        "Loading scene 100% ... Please wait!".into()
    )));
}

#[tokio::test]
async fn test_start_match_password_gate_defers_scene_load() {
    let loader = RecordingSceneLoader::new();
    let (client_end, allocator_end) = memory::pair();
    let _log = spawn_allocator(allocator_end, Script::NeverFinalize);
    let spawner = SpawnerClient::new(client_end, JsonCodec);

    let gate = Arc::new(Notify::new());
    let shown = Arc::new(Mutex::new(Vec::new()));
    let prompt = GatedPrompt {
        gate: Arc::clone(&gate),
        answer: true,
        shown: Arc::clone(&shown),
    };
    let mut orchestrator = MatchJoinOrchestrator::new(
        spawner,
        MatchmakingConfig::default(),
        loader.clone(),
        prompt,
    );

    let join = tokio::spawn(async move {
        orchestrator.start_match(locked_room()).await.unwrap();
        orchestrator
    });

    // Let the join task run up to the prompt.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert_eq!(shown.lock().unwrap().len(), 1, "prompt must be shown");
    assert!(
        loader.loads().is_empty(),
        "scene must not load before the password continuation fires"
    );

    gate.notify_one();
    let orchestrator = join.await.unwrap();

    assert_eq!(loader.loads(), vec!["Room".to_string()]);
    assert_eq!(orchestrator.session().state(), SessionState::Joined);
}

#[tokio::test]
async fn test_start_match_cancelled_password_abandons_join() {
    let loader = RecordingSceneLoader::new();
    let (client_end, allocator_end) = memory::pair();
    let _log = spawn_allocator(allocator_end, Script::NeverFinalize);
    let spawner = SpawnerClient::new(client_end, JsonCodec);
    let mut orchestrator = MatchJoinOrchestrator::new(
        spawner,
        MatchmakingConfig::default(),
        loader.clone(),
        ImmediatePrompt { answer: false },
    );
    let mut events = orchestrator.subscribe();

    orchestrator.start_match(locked_room()).await.unwrap();

    assert!(loader.loads().is_empty());
    assert_ne!(orchestrator.session().state(), SessionState::Joined);
    // A cancelled dialog is a user decision, not a failure.
    let events = drain(&mut events);
    assert!(!events.iter().any(|e| matches!(e, MatchEvent::Error(_))));
}

#[tokio::test]
async fn test_start_match_scene_failure_becomes_error_event() {
    let loader = RecordingSceneLoader::failing();
    let (mut orchestrator, _log) = orchestrator_with(
        Script::NeverFinalize,
        MatchmakingConfig::default(),
        loader.clone(),
    );
    let mut events = orchestrator.subscribe();

    // The failure stays inside the event channel.
    orchestrator.start_match(plain_room()).await.unwrap();

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        MatchEvent::Error(msg) if msg.contains("scene load failed")
    )));
    assert_ne!(orchestrator.session().state(), SessionState::Joined);
}

// =========================================================================
// Full flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spawn_then_start_match_end_to_end() {
    let (mut orchestrator, log) = orchestrator_with(
        Script::FinalizeAfter(Duration::from_secs(2)),
        MatchmakingConfig::default(),
        RecordingSceneLoader::new(),
    );
    let mut events = orchestrator.subscribe();

    let outcome = orchestrator
        .create_new_room(Region::new("eu-west"), capacity_options(4))
        .await
        .unwrap();
    assert_eq!(outcome, AttemptOutcome::Started);

    // Room metadata arrives via a separate server message.
    orchestrator.start_match(plain_room()).await.unwrap();

    assert_eq!(orchestrator.session().state(), SessionState::Joined);
    assert!(log.aborts().is_empty());

    let events = drain(&mut events);
    let started = events
        .iter()
        .filter(|e| **e == MatchEvent::RoomStarted)
        .count();
    assert_eq!(started, 1, "one user action, one room-started event");
}
