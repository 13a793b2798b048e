//! Background sync queue for requests deferred while offline
//!
//! Writes attempted while offline (with the caller's consent) are parked
//! here and replayed once connectivity returns. The queue is kept sorted by
//! priority, FIFO within a tier. A replay failure demotes the item to
//! [`SyncPriority::Low`] and defers it to the next pass, so one persistently
//! failing item never blocks the rest of a pass.
//!
//! Replay failures are swallowed: the caller's completion channel resolves
//! only when a replay eventually succeeds (or, when a replay bound is
//! configured, with the final error once the bound is hit). Nothing here is
//! persisted — queued work is lost if the process exits before reconnecting.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connectivity::OnlineMonitor;
use crate::error::ApiResult;

/// Replay priority; higher tiers replay first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncPriority {
    /// Replayed before everything else
    High = 0,
    /// Default tier
    Medium = 1,
    /// Lowest tier; failed items are demoted here
    Low = 2,
}

impl fmt::Display for SyncPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Identifier of a queued sync item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncId(Uuid);

impl fmt::Display for SyncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Factory producing a fresh request future per replay attempt.
pub type SyncRequest = Box<dyn Fn() -> BoxFuture<'static, ApiResult<Value>> + Send + Sync>;

struct SyncItem {
    id: SyncId,
    request: SyncRequest,
    priority: SyncPriority,
    sequence: u64,
    attempts: u32,
    done: Option<oneshot::Sender<ApiResult<Value>>>,
}

/// Read-only view of a queued item, for inspection and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSync {
    /// Item identifier
    pub id: SyncId,
    /// Current replay tier
    pub priority: SyncPriority,
    /// Failed replays so far
    pub attempts: u32,
}

struct QueueInner {
    items: Mutex<Vec<SyncItem>>,
    next_sequence: AtomicU64,
    monitor: OnlineMonitor,
    max_attempts: Option<u32>,
    // Serializes replay passes; enqueue stays lock-free with respect to it.
    pass_guard: tokio::sync::Mutex<()>,
}

/// Priority-ordered queue of deferred requests
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct BackgroundSyncQueue {
    inner: Arc<QueueInner>,
}

impl BackgroundSyncQueue {
    /// Create a queue tied to an online monitor
    ///
    /// `max_attempts = None` preserves the unbounded retry-demotion loop: a
    /// permanently failing item cycles forever at [`SyncPriority::Low`].
    pub fn new(monitor: OnlineMonitor, max_attempts: Option<u32>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                items: Mutex::new(Vec::new()),
                next_sequence: AtomicU64::new(0),
                monitor,
                max_attempts,
                pass_guard: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Defer a request for replay on reconnect
    ///
    /// The receiver resolves when a replay succeeds. Replay failures are
    /// logged and demoted, not delivered — a caller awaiting a permanently
    /// failing item (with no replay bound) never observes the failure.
    pub fn enqueue(
        &self,
        request: SyncRequest,
        priority: SyncPriority,
    ) -> (SyncId, oneshot::Receiver<ApiResult<Value>>) {
        let (tx, rx) = oneshot::channel();
        let id = SyncId(Uuid::new_v4());
        let item = SyncItem {
            id,
            request,
            priority,
            sequence: self.inner.next_sequence.fetch_add(1, Ordering::SeqCst),
            attempts: 0,
            done: Some(tx),
        };

        let mut items = self.inner.items.lock();
        items.push(item);
        items.sort_by_key(|item| (item.priority, item.sequence));
        debug!(%id, %priority, queued = items.len(), "queued request for background sync");

        (id, rx)
    }

    /// Replay queued items, highest priority first
    ///
    /// No-op when offline or empty. The queue is snapshotted and cleared up
    /// front; items are replayed sequentially, and a failure re-queues that
    /// item at [`SyncPriority::Low`] for the *next* pass. Succeeded items
    /// are never rolled back by a later failure in the same pass.
    pub async fn process(&self) {
        if !self.inner.monitor.is_online() {
            debug!("skipping background sync: offline");
            return;
        }

        let _pass = self.inner.pass_guard.lock().await;

        let batch = std::mem::take(&mut *self.inner.items.lock());
        if batch.is_empty() {
            return;
        }
        info!(count = batch.len(), "processing background sync queue");

        for mut item in batch {
            match (item.request)().await {
                Ok(value) => {
                    debug!(id = %item.id, "background sync item replayed");
                    if let Some(done) = item.done.take() {
                        let _ = done.send(Ok(value));
                    }
                }
                Err(error) => {
                    item.attempts += 1;
                    if let Some(max) = self.inner.max_attempts {
                        if item.attempts >= max {
                            warn!(
                                id = %item.id,
                                attempts = item.attempts,
                                %error,
                                "dropping background sync item: replay bound reached"
                            );
                            if let Some(done) = item.done.take() {
                                let _ = done.send(Err(error));
                            }
                            continue;
                        }
                    }

                    warn!(
                        id = %item.id,
                        attempts = item.attempts,
                        %error,
                        "background sync item failed, demoting to low priority"
                    );
                    item.priority = SyncPriority::Low;
                    item.sequence = self.inner.next_sequence.fetch_add(1, Ordering::SeqCst);

                    let mut items = self.inner.items.lock();
                    items.push(item);
                    items.sort_by_key(|item| (item.priority, item.sequence));
                }
            }
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().is_empty()
    }

    /// Snapshot of queued items in replay order
    pub fn pending(&self) -> Vec<PendingSync> {
        self.inner
            .items
            .lock()
            .iter()
            .map(|item| PendingSync { id: item.id, priority: item.priority, attempts: item.attempts })
            .collect()
    }
}
