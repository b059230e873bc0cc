//! The spawner client: request/reply bookkeeping over one allocator
//! connection.
//!
//! One `SpawnerClient` owns one connection. A background read task decodes
//! allocator events and routes them: accepted/rejected replies resolve the
//! request that is waiting on them (matched by `seq`), status pushes update
//! the per-task watch channel that [`SpawnHandle`]s observe.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use matchlink_protocol::{
    Codec, Region, SpawnOptions, SpawnStatus, SpawnTaskId, SpawnerEvent,
    SpawnerRequest,
};
use matchlink_transport::Connection;
use tokio::sync::{Mutex, oneshot, watch};

use crate::{SpawnError, SpawnHandle};

/// Outcome of one spawn request, resolved by the read loop.
type ReplyOutcome = Result<SpawnHandle, (u16, String)>;

/// Bookkeeping shared between the API side and the read loop.
struct Router {
    /// Requests awaiting an accepted/rejected reply, keyed by `seq`.
    pending: Mutex<HashMap<u64, oneshot::Sender<ReplyOutcome>>>,
    /// Status feeds for accepted tasks, keyed by task id.
    tasks: Mutex<HashMap<SpawnTaskId, watch::Sender<SpawnStatus>>>,
}

/// Client for the allocator's spawner API.
///
/// All methods take `&self`, so the client can sit behind an `Arc` or live
/// directly inside the orchestrator.
pub struct SpawnerClient<C: Connection, D: Codec> {
    conn: Arc<C>,
    codec: Arc<D>,
    router: Arc<Router>,
    next_seq: AtomicU64,
}

impl<C: Connection, D: Codec> SpawnerClient<C, D> {
    /// Wraps a connection and starts the background read loop.
    ///
    /// The loop runs until the connection closes or errors; at that point
    /// every in-flight request resolves to [`SpawnError::ConnectionLost`]
    /// and all status feeds close.
    pub fn new(conn: C, codec: D) -> Self {
        let conn = Arc::new(conn);
        let codec = Arc::new(codec);
        let router = Arc::new(Router {
            pending: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
        });

        tokio::spawn(read_loop(
            Arc::clone(&conn),
            Arc::clone(&codec),
            Arc::clone(&router),
        ));

        Self {
            conn,
            codec,
            router,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Asks the allocator to start a new room process.
    ///
    /// Resolves once the allocator accepts or rejects the request. The
    /// returned handle starts at [`SpawnStatus::Queued`] and is updated as
    /// the allocator pushes progress.
    ///
    /// # Errors
    /// - [`SpawnError::Rejected`] — the allocator refused the request
    /// - [`SpawnError::ConnectionLost`] — the connection died first
    pub async fn request_spawn(
        &self,
        options: SpawnOptions,
        region: Region,
    ) -> Result<SpawnHandle, SpawnError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.router.pending.lock().await.insert(seq, reply_tx);

        let request = SpawnerRequest::RequestSpawn {
            seq,
            options: options.public,
            custom_options: options.private,
            region,
        };
        let bytes = self.codec.encode(&request)?;

        tracing::debug!(seq, "sending spawn request");

        if let Err(e) = self.conn.send(&bytes).await {
            self.router.pending.lock().await.remove(&seq);
            return Err(SpawnError::ConnectionLost(e.to_string()));
        }

        match reply_rx.await {
            Ok(Ok(handle)) => {
                tracing::info!(
                    seq,
                    task_id = %handle.task_id(),
                    "spawn request accepted"
                );
                Ok(handle)
            }
            Ok(Err((code, message))) => {
                Err(SpawnError::Rejected { code, message })
            }
            // Read loop dropped the sender: connection is gone.
            Err(_) => Err(SpawnError::ConnectionLost(
                "allocator connection closed".into(),
            )),
        }
    }

    /// Best-effort cancel of an in-flight (or already-finalized) task.
    ///
    /// Fire-and-forget: used for cleanup after the orchestration has
    /// already failed, so failures here are logged and never returned
    /// (they must not mask the original failure). Aborting a task that has
    /// already finalized is tolerated by the allocator.
    pub async fn abort_spawn(&self, task_id: SpawnTaskId) {
        let request = SpawnerRequest::AbortSpawn { task_id };
        let bytes = match self.codec.encode(&request) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "failed to encode abort request");
                return;
            }
        };
        match self.conn.send(&bytes).await {
            Ok(()) => tracing::debug!(%task_id, "abort request sent"),
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "abort request failed to send");
            }
        }
    }

    /// Closes the allocator connection, ending the read loop.
    pub async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(error = %e, "allocator connection close failed");
        }
    }
}

/// Decodes allocator events and routes them until the connection ends.
async fn read_loop<C: Connection, D: Codec>(
    conn: Arc<C>,
    codec: Arc<D>,
    router: Arc<Router>,
) {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!("allocator connection closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "allocator connection error");
                break;
            }
        };

        let event: SpawnerEvent = match codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable allocator event, skipping");
                continue;
            }
        };

        dispatch(&router, event).await;
    }

    // Fail everything still in flight, then drop the status senders so
    // waiting handles observe a closed channel instead of hanging.
    for (seq, _reply) in router.pending.lock().await.drain() {
        tracing::debug!(seq, "dropping in-flight spawn request");
    }
    router.tasks.lock().await.clear();
}

/// Routes one decoded event to its waiter or status feed.
async fn dispatch(router: &Router, event: SpawnerEvent) {
    match event {
        SpawnerEvent::SpawnAccepted { seq, task_id } => {
            let Some(reply) = router.pending.lock().await.remove(&seq)
            else {
                tracing::debug!(seq, %task_id, "accepted reply with no waiter");
                return;
            };
            let (status_tx, status_rx) =
                watch::channel(SpawnStatus::Queued);
            router.tasks.lock().await.insert(task_id, status_tx);
            let _ = reply.send(Ok(SpawnHandle::new(task_id, status_rx)));
        }

        SpawnerEvent::SpawnRejected { seq, code, message } => {
            let Some(reply) = router.pending.lock().await.remove(&seq)
            else {
                tracing::debug!(seq, code, "rejection with no waiter");
                return;
            };
            tracing::warn!(seq, code, %message, "spawn request rejected");
            let _ = reply.send(Err((code, message)));
        }

        SpawnerEvent::StatusChanged { task_id, status } => {
            match router.tasks.lock().await.get(&task_id) {
                Some(status_tx) => {
                    tracing::debug!(%task_id, %status, "task status changed");
                    status_tx.send_replace(status);
                }
                None => {
                    tracing::debug!(
                        %task_id, %status,
                        "status for unknown task, ignoring"
                    );
                }
            }
        }

        SpawnerEvent::AbortAck { task_id } => {
            tracing::debug!(%task_id, "abort acknowledged");
        }
    }
}
