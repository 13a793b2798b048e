//! The API client façade
//!
//! [`ApiClient`] is the single entry point UI code holds. It composes the
//! transport, cache, deduplicator, retry loop, background sync queue, and
//! online monitor, and exposes one typed method per backend endpoint.

mod client;
mod endpoints;
pub mod types;

pub use client::ApiClient;
