//! In-flight request deduplication
//!
//! Concurrent callers that present the same key share a single underlying
//! future and observe the same resolution or rejection. The in-flight map is
//! written under the lock before the future is first polled, so two
//! near-simultaneous calls for one key always collapse to one execution
//! regardless of task scheduling.
//!
//! Entry removal lives inside the shared future, not in any particular
//! caller: whichever waiter drives the request to completion cleans the map
//! up just before the result is handed out. A caller that is cancelled
//! mid-await (timeout, `select!`, dropped task) therefore cannot leak the
//! entry — the next caller for that key simply resumes the in-flight work.
//!
//! Intended for idempotent reads; the caller chooses the key (typically
//! method name plus serialized parameters).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

type SharedRequest<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;
type InFlightMap<T, E> = Arc<Mutex<HashMap<String, SharedRequest<T, E>>>>;

/// Keyed in-flight request map
///
/// Invariant: at most one live future per key, and the entry is removed
/// unconditionally once that future settles — success, failure, or with the
/// original caller long gone.
pub struct RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    in_flight: InFlightMap<T, E>,
}

impl<T, E> RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create an empty deduplicator
    pub fn new() -> Self {
        Self { in_flight: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Execute `request` under `key`, sharing any in-flight execution
    ///
    /// If another call is already running under the same key, `request` is
    /// dropped unexecuted and this call awaits the existing one.
    pub async fn dedupe<F>(&self, key: &str, request: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.in_flight.lock();
            if let Some(existing) = in_flight.get(key) {
                debug!(key, "joining in-flight request");
                existing.clone()
            } else {
                // The wrapper removes its own entry before resolving, so
                // cleanup happens with whichever caller completes the poll,
                // not only the one that created the entry.
                let map = Arc::clone(&self.in_flight);
                let owned_key = key.to_string();
                let shared = async move {
                    let result = request.await;
                    map.lock().remove(&owned_key);
                    result
                }
                .boxed()
                .shared();
                in_flight.insert(key.to_string(), shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Number of requests currently in flight
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }
}

impl<T, E> Default for RequestDeduplicator<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
