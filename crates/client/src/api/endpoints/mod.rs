//! One typed method per backend endpoint, grouped by resource
//!
//! Each method delegates to [`ApiClient`](crate::api::ApiClient)'s request
//! pipeline and decodes the inner (envelope-stripped) payload. GET reads opt
//! into deduplication and caching; offline-tolerant writes opt into
//! background sync.

mod applications;
mod auth;
mod events;
mod policies;
mod posts;
mod users;
