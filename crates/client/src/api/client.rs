//! The `ApiClient` composition root
//!
//! One constructed instance owns every piece of process-wide state the
//! client layer needs: transport (with its bearer token), response cache,
//! request deduplicator, background sync queue, and the online monitor.
//! Clones share that state; tests get a fresh instance each.
//!
//! Every call runs through [`execute`](struct@ApiClient), which applies the
//! decision order: defer to background sync when offline and the call opted
//! in; otherwise fail fast offline; dedupe and cache opted-in GETs; wrap the
//! actual send in retry-with-backoff; strip the response envelope.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::FutureExt;
use rallypoint_common::cache::MobileCache;
use rallypoint_common::dedupe::RequestDeduplicator;
use rallypoint_common::retry::{retry_with_backoff, PredicateRetry};
use reqwest::Method;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::config::{ClientConfig, CACHE_CLEANUP_INTERVAL};
use crate::connectivity::{
    ConnectionQuality, ConnectivityProbe, OnlineMonitor, Subscription, SystemProbe,
};
use crate::error::{ApiError, ApiResult};
use crate::sync::{BackgroundSyncQueue, SyncPriority, SyncRequest};
use crate::transport::{Transport, UnauthorizedCallback};

/// Per-call behavior toggles; endpoint methods pick these, not callers
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RequestOptions {
    /// Collapse concurrent identical GETs into one request
    pub dedupe: bool,
    /// Serve from / store into the response cache (GET only)
    pub cache: bool,
    /// Defer to the background sync queue when offline
    pub background_sync: Option<SyncPriority>,
}

impl RequestOptions {
    /// Deduplicated, cached GET
    pub fn cached_get() -> Self {
        Self { dedupe: true, cache: true, background_sync: None }
    }

    /// Deduplicated GET that must not serve stale data
    pub fn fresh_get() -> Self {
        Self { dedupe: true, cache: false, background_sync: None }
    }

    /// Write that is queued for replay when attempted offline
    pub fn deferred(priority: SyncPriority) -> Self {
        Self { dedupe: false, cache: false, background_sync: Some(priority) }
    }
}

pub(crate) struct ClientInner {
    config: ClientConfig,
    transport: Transport,
    cache: MobileCache<String, Value>,
    dedupe: RequestDeduplicator<Value, ApiError>,
    sync: BackgroundSyncQueue,
    monitor: OnlineMonitor,
    probe: Arc<dyn ConnectivityProbe>,
}

impl ClientInner {
    async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let policy = PredicateRetry::new(|error: &ApiError, _attempt| error.is_retryable());
        retry_with_backoff(&self.config.retry, &policy, || {
            self.transport.request(method.clone(), path, body)
        })
        .await
    }
}

/// Composition root for the Rallypoint client layer
///
/// Cheap to clone; clones share token, cache, queues, and monitor.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// Build a client with the default probe (assume online, quality unknown)
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP transport cannot be built.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        Self::with_probe(config, Arc::new(SystemProbe))
    }

    /// Build a client over an explicit connectivity probe
    ///
    /// Host apps pass the bridge that forwards platform signals; tests pass
    /// a [`StaticProbe`](crate::connectivity::StaticProbe).
    pub fn with_probe(config: ClientConfig, probe: Arc<dyn ConnectivityProbe>) -> ApiResult<Self> {
        let transport = Transport::new(&config, Arc::clone(&probe))?;
        let monitor = OnlineMonitor::new(probe.as_ref());
        let sync = BackgroundSyncQueue::new(monitor.clone(), config.sync_max_attempts);
        let cache = MobileCache::with_default_ttl(config.cache_ttl);

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                cache,
                dedupe: RequestDeduplicator::new(),
                sync,
                monitor,
                probe,
            }),
        })
    }

    /// The online monitor, for host apps that bridge platform signals
    pub fn monitor(&self) -> &OnlineMonitor {
        &self.inner.monitor
    }

    /// Current connectivity flag
    pub fn is_online(&self) -> bool {
        self.inner.monitor.is_online()
    }

    /// Record a platform connectivity signal
    pub fn set_online(&self, online: bool) {
        self.inner.monitor.set_online(online);
    }

    /// Whether a session token is held
    pub fn has_token(&self) -> bool {
        self.inner.transport.has_token()
    }

    /// Register the callback fired when the backend invalidates the session
    pub fn set_on_unauthorized(&self, callback: UnauthorizedCallback) {
        self.inner.transport.set_on_unauthorized(callback);
    }

    /// Number of requests waiting for background sync
    pub fn pending_sync_count(&self) -> usize {
        self.inner.sync.len()
    }

    /// Replay the background sync queue now
    pub async fn process_background_sync(&self) {
        self.inner.sync.process().await;
    }

    /// Schedule background sync on every offline→online transition
    ///
    /// Must be called from within a tokio runtime; the runtime handle is
    /// captured here so the platform bridge may report transitions from any
    /// thread, async or not. Dropping the returned [`Subscription`]
    /// disables the trigger.
    pub fn spawn_sync_trigger(&self) -> Subscription {
        let handle = tokio::runtime::Handle::current();
        let weak = Arc::downgrade(&self.inner);
        self.inner.monitor.subscribe(move |online| {
            if !online {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                info!("back online, scheduling background sync");
                handle.spawn(async move { inner.sync.process().await });
            }
        })
    }

    /// Sweep stale cache entries every five minutes until the client drops
    pub fn spawn_cache_janitor(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            ticker.tick().await; // the first tick completes immediately
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => inner.cache.cleanup(),
                    None => break,
                }
            }
        })
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.inner.transport
    }

    /// Drop the cached response for a GET path, after a related mutation
    pub(crate) fn invalidate_path(&self, path: &str) {
        self.inner.cache.invalidate(&cache_key(&Method::GET, path));
    }

    pub(crate) async fn get_cached(&self, path: &str) -> ApiResult<Value> {
        self.execute(Method::GET, path.to_string(), None, RequestOptions::cached_get()).await
    }

    pub(crate) async fn get_fresh(&self, path: &str) -> ApiResult<Value> {
        self.execute(Method::GET, path.to_string(), None, RequestOptions::fresh_get()).await
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        self.execute(method, path.to_string(), body, RequestOptions::default()).await
    }

    pub(crate) async fn send_or_defer(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        priority: SyncPriority,
    ) -> ApiResult<Value> {
        self.execute(method, path.to_string(), body, RequestOptions::deferred(priority)).await
    }

    #[instrument(level = "debug", skip(self, body, options))]
    async fn execute(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResult<Value> {
        if !self.inner.monitor.is_online() {
            if let Some(priority) = options.background_sync {
                return self.defer(method, path, body, priority).await;
            }
            debug!("offline and not deferrable, failing fast");
            return Err(ApiError::Offline);
        }

        let key = cache_key(&method, &path);

        if method == Method::GET && options.cache {
            if let Some(hit) = self.inner.cache.get(&key) {
                debug!(key, "cache hit");
                return Ok(hit);
            }
        }

        let value = if method == Method::GET && options.dedupe {
            let inner = Arc::clone(&self.inner);
            let (method, path, body) = (method.clone(), path.clone(), body.clone());
            self.inner
                .dedupe
                .dedupe(&key, async move {
                    inner.send_with_retry(method, &path, body.as_ref()).await
                })
                .await?
        } else {
            self.inner.send_with_retry(method.clone(), &path, body.as_ref()).await?
        };

        let value = unwrap_envelope(value);

        if method == Method::GET && options.cache {
            self.inner.cache.insert_with_ttl(key, value.clone(), self.cache_ttl());
        }

        Ok(value)
    }

    /// Park the request on the sync queue; resolves when a replay succeeds
    async fn defer(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
        priority: SyncPriority,
    ) -> ApiResult<Value> {
        info!(%method, path, %priority, "offline, deferring to background sync");

        let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
        let request: SyncRequest = Box::new(move || {
            let weak = weak.clone();
            let (method, path, body) = (method.clone(), path.clone(), body.clone());
            async move {
                let Some(inner) = weak.upgrade() else {
                    return Err(ApiError::Offline);
                };
                inner.send_with_retry(method, &path, body.as_ref()).await.map(unwrap_envelope)
            }
            .boxed()
        });

        let (_id, rx) = self.inner.sync.enqueue(request, priority);
        // The sender is dropped only on teardown before any replay succeeded.
        rx.await.unwrap_or_else(|_| Err(ApiError::Offline))
    }

    fn cache_ttl(&self) -> Duration {
        if self.inner.probe.quality() == ConnectionQuality::Slow {
            self.inner.config.slow_link_cache_ttl
        } else {
            self.inner.config.cache_ttl
        }
    }
}

fn cache_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

/// Strip the backend `{ success, message?, data }` envelope
///
/// Some endpoints wrap twice; `data.data` wins whenever it is present,
/// whether or not the inner object repeats the `success` flag.
/// Non-enveloped bodies pass through untouched.
fn unwrap_envelope(value: Value) -> Value {
    let Value::Object(mut map) = value else { return value };
    if !(map.contains_key("success") && map.contains_key("data")) {
        return Value::Object(map);
    }

    let data = map.remove("data").unwrap_or(Value::Null);
    let Value::Object(mut inner) = data else { return data };
    if inner.contains_key("data") {
        return inner.remove("data").unwrap_or(Value::Null);
    }
    Value::Object(inner)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn single_envelope_yields_data() {
        let value = json!({"success": true, "message": "ok", "data": {"id": 1}});
        assert_eq!(unwrap_envelope(value), json!({"id": 1}));
    }

    #[test]
    fn double_envelope_yields_the_inner_data() {
        let value = json!({
            "success": true,
            "data": {"success": true, "data": {"id": 1}},
        });
        assert_eq!(unwrap_envelope(value), json!({"id": 1}));
    }

    #[test]
    fn inner_data_wins_even_without_an_inner_success_flag() {
        let value = json!({
            "success": true,
            "data": {"data": {"id": 2}},
        });
        assert_eq!(unwrap_envelope(value), json!({"id": 2}));
    }

    #[test]
    fn non_envelope_bodies_pass_through() {
        assert_eq!(unwrap_envelope(json!([1, 2, 3])), json!([1, 2, 3]));
        assert_eq!(unwrap_envelope(json!({"id": 1})), json!({"id": 1}));
        assert_eq!(unwrap_envelope(Value::Null), Value::Null);
        // "success" without "data" is just a field, not an envelope
        assert_eq!(unwrap_envelope(json!({"success": true})), json!({"success": true}));
    }

    #[test]
    fn enveloped_scalar_data_is_returned_as_is() {
        let value = json!({"success": true, "data": [1, 2]});
        assert_eq!(unwrap_envelope(value), json!([1, 2]));
    }
}
