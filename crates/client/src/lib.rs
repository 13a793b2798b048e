//! Mobile-resilient client for the Rallypoint backend
//!
//! Members use the app from rallies, trains, and rural town halls; this
//! crate exists to make flaky links survivable. It layers, bottom to top:
//!
//! - [`transport`] — HTTP with bearer injection, connection-quality hints,
//!   and every failure normalized into [`ApiError`];
//! - [`connectivity`] — the [`ConnectivityProbe`] capability trait plus the
//!   [`OnlineMonitor`] that fans out online/offline transitions;
//! - [`sync`] — the priority queue replaying offline writes on reconnect;
//! - [`api`] — the [`ApiClient`] composition root tying those to the
//!   resilience utilities in `rallypoint-common` (TTL cache, request
//!   deduplication, retry with backoff) and exposing one typed method per
//!   backend endpoint.
//!
//! Everything is best-effort and process-lifetime only: no persistence, no
//! exactly-once delivery, no cross-device sync.
//!
//! [`ConnectivityProbe`]: connectivity::ConnectivityProbe
//! [`OnlineMonitor`]: connectivity::OnlineMonitor

pub mod api;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod sync;
pub mod transport;

pub use api::types::{
    AuthResponse, Event, LoginRequest, NewPost, PageInfo, Paginated, PendingApplication,
    PolicyDocument, PolicyUpdate, Post, RegisterRequest, User, UserUpdate,
};
pub use api::ApiClient;
pub use config::ClientConfig;
pub use connectivity::{ConnectionQuality, ConnectivityProbe, StaticProbe, SystemProbe};
pub use error::{ApiError, ApiResult};
pub use sync::SyncPriority;
