//! Viewer registry - the broadcast fanout for live dashboard sessions.
//!
//! Every connected viewer owns a bounded outbound queue. The registry holds
//! the sending half of each queue, keyed by viewer id.
//!
//! ```text
//!                  ┌── viewer-a queue ──▶ socket a
//! on_update ──────▶├── viewer-b queue ──▶ socket b
//!                  └── viewer-c queue ──▶ socket c
//! ```
//!
//! A viewer that cannot keep up is disconnected rather than left behind: its
//! client reconnects and starts again from the current snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use crate::adapters::storage::SnapshotStore;
use crate::domain::foundation::ViewerId;
use crate::domain::telemetry::Snapshot;
use crate::ports::SnapshotPublisher;

use super::messages::Outbound;

/// Default capacity of each viewer's outbound queue.
pub const DEFAULT_SESSION_BUFFER: usize = 128;

/// Registry of connected viewers.
///
/// # Thread Safety
///
/// Uses `RwLock` for the session map since broadcasts (reads) vastly
/// outnumber connects/disconnects (writes). Opening a session and an
/// explicit resync both hold the write lock while reading the store, so a
/// snapshot read from the store can never be queued behind a newer broadcast.
pub struct ViewerRegistry {
    sessions: RwLock<HashMap<ViewerId, mpsc::Sender<Outbound>>>,
    store: Arc<SnapshotStore>,
    buffer: usize,
    /// Set by `close_all`; only read or written under the sessions write lock.
    closed: AtomicBool,
}

impl ViewerRegistry {
    /// Create a registry whose viewers get queues of `buffer` messages.
    ///
    /// A zero buffer is raised to one so the initial snapshot always fits.
    pub fn new(store: Arc<SnapshotStore>, buffer: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            buffer: buffer.max(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Create with default buffer (128 messages).
    pub fn with_default_buffer(store: Arc<SnapshotStore>) -> Self {
        Self::new(store, DEFAULT_SESSION_BUFFER)
    }

    /// Register a viewer and queue the current snapshot for it alone.
    ///
    /// Returns the receiver the viewer's socket task drains. After
    /// `close_all` the viewer is not registered and the receiver is already
    /// closed, so its socket task closes the connection straight away.
    pub async fn on_session_opened(&self, viewer_id: ViewerId) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(self.buffer);

        let mut sessions = self.sessions.write().await;
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!(viewer_id = %viewer_id, "Registry closed, refusing viewer");
            return rx;
        }
        // Fresh channel with capacity >= 1, cannot fail.
        let _ = tx.try_send(Outbound::Snapshot(self.store.read()));
        sessions.insert(viewer_id, tx);

        rx
    }

    /// Deregister a viewer. Returns false if it was already gone.
    pub async fn on_session_closed(&self, viewer_id: &ViewerId) -> bool {
        self.sessions.write().await.remove(viewer_id).is_some()
    }

    /// Queue `snapshot` for every registered viewer.
    ///
    /// Viewers whose queue is full or whose socket task is gone are
    /// deregistered. A full viewer's socket task drains what is already
    /// queued and then closes the connection. Returns the number of viewers
    /// the snapshot was queued for.
    pub async fn on_update(&self, snapshot: Snapshot) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        {
            let sessions = self.sessions.read().await;
            for (viewer_id, tx) in sessions.iter() {
                match tx.try_send(Outbound::Snapshot(snapshot.clone())) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            viewer_id = %viewer_id,
                            "Viewer queue full, disconnecting slow viewer"
                        );
                        evicted.push(*viewer_id);
                    }
                    Err(TrySendError::Closed(_)) => evicted.push(*viewer_id),
                }
            }
        }

        if !evicted.is_empty() {
            let mut sessions = self.sessions.write().await;
            for viewer_id in &evicted {
                sessions.remove(viewer_id);
                tracing::debug!(viewer_id = %viewer_id, "Removed viewer during broadcast");
            }
        }

        delivered
    }

    /// Queue a message for one viewer. Returns false if the viewer is not
    /// registered or its queue cannot take the message.
    pub async fn send_to(&self, viewer_id: &ViewerId, message: Outbound) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(viewer_id) {
            Some(tx) => tx.try_send(message).is_ok(),
            None => false,
        }
    }

    /// Queue the current snapshot for one viewer (explicit resync).
    pub async fn send_current(&self, viewer_id: &ViewerId) -> bool {
        // Write lock: no broadcast may interleave with the store read.
        let sessions = self.sessions.write().await;
        match sessions.get(viewer_id) {
            Some(tx) => tx.try_send(Outbound::Snapshot(self.store.read())).is_ok(),
            None => false,
        }
    }

    /// Number of connected viewers.
    pub async fn viewer_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Stop accepting viewers and deregister every viewer, closing their
    /// queues.
    ///
    /// Socket tasks see their queue end and close the connection.
    /// Returns how many viewers were connected.
    pub async fn close_all(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.closed.store(true, Ordering::SeqCst);
        let count = sessions.len();
        sessions.clear();
        count
    }
}

#[async_trait]
impl SnapshotPublisher for ViewerRegistry {
    async fn publish(&self, snapshot: Snapshot) -> usize {
        self.on_update(snapshot).await
    }

    fn name(&self) -> &'static str {
        "ViewerRegistry"
    }
}
