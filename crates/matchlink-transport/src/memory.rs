//! In-process connection pair for tests and demos.
//!
//! [`pair`] returns two [`MemoryConnection`]s wired back to back: whatever
//! one side sends, the other receives. This lets the whole stack (spawner
//! client, orchestrator, a scripted allocator) run in a single process
//! without sockets, which keeps the integration tests deterministic.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use crate::{Connection, ConnectionId, TransportError};

static NEXT_PAIR_ID: AtomicU64 = AtomicU64::new(1);

/// One end of an in-process connection.
pub struct MemoryConnection {
    id: ConnectionId,
    /// `None` after a local close; the peer's receiver then drains to `None`.
    outbound: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

/// Creates two connections wired back to back.
pub fn pair() -> (MemoryConnection, MemoryConnection) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();

    let base = NEXT_PAIR_ID.fetch_add(2, Ordering::Relaxed);

    let a = MemoryConnection {
        id: ConnectionId::new(base),
        outbound: Mutex::new(Some(a_tx)),
        inbound: Mutex::new(a_rx),
    };
    let b = MemoryConnection {
        id: ConnectionId::new(base + 1),
        outbound: Mutex::new(Some(b_tx)),
        inbound: Mutex::new(b_rx),
    };
    (a, b)
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let outbound = self.outbound.lock().await;
        let tx = outbound.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("locally closed".into())
        })?;
        tx.send(data.to_vec()).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.inbound.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.outbound.lock().await.take();
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
