//! Bounded wait for a spawn task to finalize.
//!
//! The deadline is hard: if the task has not satisfied the predicate when
//! the timeout elapses, the wait reports [`WaitTimedOut`] even if the task
//! finalizes a moment later. The timer and the status subscription are both
//! scoped to the call; nothing keeps ticking after the wait returns.

use std::time::Duration;

use matchlink_protocol::SpawnStatus;
use tokio::time::{self, Instant};

use crate::SpawnHandle;

/// The finalize-wait deadline elapsed before the task satisfied the
/// predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("finalize wait deadline exceeded")]
pub struct WaitTimedOut;

/// Waits until the handle's status satisfies `predicate`, or until
/// `timeout` elapses, whichever comes first.
///
/// The predicate is evaluated against the current status before any timer
/// is armed, so a `timeout` of zero succeeds exactly when the task is
/// already in the wanted state and times out immediately otherwise.
///
/// The deadline never fires early. If the status feed closes mid-wait
/// (allocator connection gone), the wait still holds the deadline and then
/// reports [`WaitTimedOut`]: the caller-visible contract is "satisfied by
/// the deadline, or not".
pub async fn wait_until<F>(
    handle: &mut SpawnHandle,
    mut predicate: F,
    timeout: Duration,
) -> Result<SpawnStatus, WaitTimedOut>
where
    F: FnMut(SpawnStatus) -> bool,
{
    let current = handle.status();
    if predicate(current) {
        return Ok(current);
    }

    let deadline = Instant::now() + timeout;
    loop {
        match time::timeout_at(deadline, handle.status_rx.changed()).await {
            // Deadline hit.
            Err(_) => return Err(WaitTimedOut),

            Ok(Ok(())) => {
                let status = handle.status();
                if predicate(status) {
                    return Ok(status);
                }
            }

            // Status feed closed: no further updates can arrive, but the
            // contract forbids reporting a timeout before the deadline.
            Ok(Err(_)) => {
                tracing::debug!(
                    task_id = %handle.task_id(),
                    "status feed closed during finalize wait"
                );
                time::sleep_until(deadline).await;
                return Err(WaitTimedOut);
            }
        }
    }
}

/// Waits until the task reaches [`SpawnStatus::Finalized`], bounded by
/// `timeout`.
pub async fn wait_until_finalized(
    handle: &mut SpawnHandle,
    timeout: Duration,
) -> Result<SpawnStatus, WaitTimedOut> {
    wait_until(handle, |status| status.is_finalized(), timeout).await
}

// =========================================================================
// Tests
// =========================================================================
