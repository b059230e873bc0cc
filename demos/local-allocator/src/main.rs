//! End-to-end Matchlink demo: an in-process allocator, a console scene
//! loader, and one full create-room → start-match flow.
//!
//! Run with `cargo run -p local-allocator`. Set `RUST_LOG=debug` to watch
//! the wire traffic bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use matchlink::prelude::*;
use matchlink_protocol::{SpawnerEvent, SpawnerRequest};
use matchlink_transport::{MemoryConnection, memory};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time;

// ---------------------------------------------------------------------------
// In-process allocator
// ---------------------------------------------------------------------------

/// Plays the master/spawner service: accepts every spawn request and
/// finalizes the task after a short provisioning delay.
async fn run_allocator(conn: MemoryConnection) {
    let conn = Arc::new(conn);
    let codec = JsonCodec;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            _ => break,
        };
        let request: SpawnerRequest = match codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "allocator: bad request");
                continue;
            }
        };

        match request {
            SpawnerRequest::RequestSpawn {
                seq,
                options,
                region,
                ..
            } => {
                let task_id = SpawnTaskId(rand::rng().random());
                tracing::info!(
                    %task_id, %region,
                    capacity = options.get("capacity").unwrap_or("-"),
                    "allocator: spawn accepted"
                );
                send(&conn, &SpawnerEvent::SpawnAccepted { seq, task_id })
                    .await;
                send(
                    &conn,
                    &SpawnerEvent::StatusChanged {
                        task_id,
                        status: SpawnStatus::Processing,
                    },
                )
                .await;

                let conn = Arc::clone(&conn);
                tokio::spawn(async move {
                    time::sleep(Duration::from_millis(1500)).await;
                    send(
                        &conn,
                        &SpawnerEvent::StatusChanged {
                            task_id,
                            status: SpawnStatus::Finalized,
                        },
                    )
                    .await;
                });
            }
            SpawnerRequest::AbortSpawn { task_id } => {
                tracing::info!(%task_id, "allocator: abort received");
                send(&conn, &SpawnerEvent::AbortAck { task_id }).await;
            }
        }
    }
}

async fn send(conn: &MemoryConnection, event: &SpawnerEvent) {
    match JsonCodec.encode(event) {
        Ok(bytes) => {
            let _ = conn.send(&bytes).await;
        }
        Err(e) => tracing::warn!(error = %e, "allocator: encode failed"),
    }
}

// ---------------------------------------------------------------------------
// Console collaborators
// ---------------------------------------------------------------------------

struct ConsoleSceneLoader;

impl SceneLoader for ConsoleSceneLoader {
    async fn load(
        &self,
        scene: &str,
        progress: mpsc::UnboundedSender<f32>,
    ) -> Result<(), SceneLoadError> {
        for step in [0.2_f32, 0.55, 0.9, 1.0] {
            time::sleep(Duration::from_millis(150)).await;
            let _ = progress.send(step);
        }
        println!(">> scene '{scene}' loaded");
        Ok(())
    }
}

struct ConsolePrompt;

impl PasswordPrompt for ConsolePrompt {
    async fn request(&self, message: &str) -> bool {
        println!(">> password prompt: {message} (auto-confirming)");
        true
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (client_end, allocator_end) = memory::pair();
    tokio::spawn(run_allocator(allocator_end));

    let spawner = SpawnerClient::new(client_end, JsonCodec);
    let config = MatchmakingConfig {
        start_room_scene: "Room".into(),
        match_creation_timeout: Duration::from_secs(10),
    };
    let mut orchestrator = MatchJoinOrchestrator::new(
        spawner,
        config,
        ConsoleSceneLoader,
        ConsolePrompt,
    );

    // Print lifecycle events as a UI layer would.
    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event: {event:?}");
        }
    });

    let mut options = OptionMap::new();
    options.set("capacity", 4).set("mode", "deathmatch");

    let outcome = orchestrator
        .create_new_room(Region::any(), options)
        .await?;
    println!(">> spawn outcome: {outcome:?}");

    if outcome == AttemptOutcome::Started {
        // In the real system this arrives as a separate server message.
        let game_info = GameInfo {
            room_id: RoomId::new("demo-room"),
            max_players: 4,
            password_protected: false,
        };
        orchestrator.start_match(game_info).await?;
        println!(
            ">> joined '{}' (state: {})",
            orchestrator.session().room_id().map(|r| r.0.as_str()).unwrap_or("?"),
            orchestrator.session().state()
        );
    }

    Ok(())
}
