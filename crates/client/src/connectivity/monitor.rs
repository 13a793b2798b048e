//! Process-wide online/offline state with listener fan-out

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::probe::ConnectivityProbe;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

struct MonitorInner {
    online: AtomicBool,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

/// Tracks the current connectivity flag and notifies subscribers
///
/// State lives for the lifetime of the owning [`ApiClient`]; clones share
/// it. Each call to [`set_online`] that actually flips the flag notifies
/// every registered listener synchronously, once per transition — rapid
/// flapping produces one notification per flip, with no debouncing.
///
/// [`ApiClient`]: crate::api::ApiClient
/// [`set_online`]: OnlineMonitor::set_online
#[derive(Clone)]
pub struct OnlineMonitor {
    inner: Arc<MonitorInner>,
}

impl OnlineMonitor {
    /// Create a monitor seeded from the probe's current reading
    pub fn new(probe: &dyn ConnectivityProbe) -> Self {
        Self::with_initial(probe.is_online())
    }

    /// Create a monitor with an explicit initial flag
    pub fn with_initial(online: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                online: AtomicBool::new(online),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current connectivity flag
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Record a platform connectivity signal
    ///
    /// No-op when the flag is unchanged; on a transition, listeners run
    /// synchronously on the calling task, in subscription order.
    pub fn set_online(&self, online: bool) {
        let previous = self.inner.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return;
        }
        debug!(online, "connectivity transition");

        // Snapshot so listeners can subscribe/unsubscribe reentrantly.
        let listeners: Vec<Listener> =
            self.inner.listeners.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(online);
        }
    }

    /// Register a listener; dropping the [`Subscription`] unsubscribes
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription { id, inner: Arc::downgrade(&self.inner) }
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Guard for a registered listener; unsubscribes on drop
pub struct Subscription {
    id: u64,
    inner: Weak<MonitorInner>,
}

impl Subscription {
    /// Remove the listener now instead of waiting for drop
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
