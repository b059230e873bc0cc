//! Spawn handle: the client-side view of one spawn task.

use matchlink_protocol::{SpawnStatus, SpawnTaskId};
use tokio::sync::watch;

/// Handle to a spawn task accepted by the allocator.
///
/// The task itself lives on the allocator; this handle carries its id and a
/// live status view fed by the [`SpawnerClient`](crate::SpawnerClient)'s
/// read loop. The handle never owns the task: dropping it does not abort
/// anything (use [`SpawnerClient::abort_spawn`](crate::SpawnerClient::abort_spawn)
/// for that).
#[derive(Debug)]
pub struct SpawnHandle {
    task_id: SpawnTaskId,
    pub(crate) status_rx: watch::Receiver<SpawnStatus>,
}

impl SpawnHandle {
    pub(crate) fn new(
        task_id: SpawnTaskId,
        status_rx: watch::Receiver<SpawnStatus>,
    ) -> Self {
        Self { task_id, status_rx }
    }

    /// The allocator-assigned task id.
    pub fn task_id(&self) -> SpawnTaskId {
        self.task_id
    }

    /// The most recently reported status.
    pub fn status(&self) -> SpawnStatus {
        *self.status_rx.borrow()
    }
}
