//! Short-window request batching with bounded concurrency
//!
//! Independently submitted requests are collected for a short window
//! (default 50 ms) and then executed in insertion-order chunks with a fixed
//! concurrency cap (default 3). Each submission gets its own completion
//! channel; a failing item never affects its batch-mates.
//!
//! This is an opt-in utility — nothing routes through it implicitly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Batch window and concurrency settings
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// How long the first item waits for company before the batch fires
    pub window: Duration,
    /// Maximum number of requests in flight at once within a batch
    pub max_concurrency: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self { window: Duration::from_millis(50), max_concurrency: 3 }
    }
}

struct BatchItem<T, E> {
    id: Uuid,
    request: BoxFuture<'static, Result<T, E>>,
    tx: oneshot::Sender<Result<T, E>>,
}

struct BatcherInner<T, E> {
    config: BatcherConfig,
    queue: Mutex<BatchQueue<T, E>>,
}

struct BatchQueue<T, E> {
    items: Vec<BatchItem<T, E>>,
    timer_armed: bool,
}

/// Queue of deferred requests sharing one collection timer
///
/// Cloning is cheap; clones share the same queue.
pub struct RequestBatcher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    inner: Arc<BatcherInner<T, E>>,
}

impl<T, E> Clone for RequestBatcher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T, E> RequestBatcher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a batcher with the default 50 ms window and concurrency of 3
    pub fn new() -> Self {
        Self::with_config(BatcherConfig::default())
    }

    /// Create a batcher with explicit settings
    pub fn with_config(config: BatcherConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        Self {
            inner: Arc::new(BatcherInner {
                config: BatcherConfig { max_concurrency, ..config },
                queue: Mutex::new(BatchQueue { items: Vec::new(), timer_armed: false }),
            }),
        }
    }

    /// Enqueue a request and receive its individual completion channel
    ///
    /// The first item enqueued while the queue is empty arms the batch
    /// timer; everything added before it fires joins the same batch. The
    /// returned receiver resolves with this item's own result once its
    /// chunk executes. Must be called within a tokio runtime.
    pub fn add<F>(&self, request: F) -> oneshot::Receiver<Result<T, E>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let item = BatchItem { id: Uuid::new_v4(), request: request.boxed(), tx };

        let arm_timer = {
            let mut queue = self.inner.queue.lock();
            queue.items.push(item);
            if queue.timer_armed {
                false
            } else {
                queue.timer_armed = true;
                true
            }
        };

        if arm_timer {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.window).await;
                Self::process(&inner).await;
            });
        }

        rx
    }

    /// Number of items waiting for the current window to fire
    pub fn pending(&self) -> usize {
        self.inner.queue.lock().items.len()
    }

    async fn process(inner: &BatcherInner<T, E>) {
        let mut batch = {
            let mut queue = inner.queue.lock();
            queue.timer_armed = false;
            std::mem::take(&mut queue.items)
        };

        if batch.is_empty() {
            return;
        }
        debug!(size = batch.len(), "processing request batch");

        // Insertion-order chunks, executed sequentially; concurrency within
        // a chunk is capped by max_concurrency.
        while !batch.is_empty() {
            let rest = batch.split_off(batch.len().min(inner.config.max_concurrency));
            let chunk = std::mem::replace(&mut batch, rest);

            join_all(chunk.into_iter().map(|item| async move {
                let result = item.request.await;
                if item.tx.send(result).is_err() {
                    debug!(id = %item.id, "batch item receiver dropped before completion");
                }
            }))
            .await;
        }
    }
}

impl<T, E> Default for RequestBatcher<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
