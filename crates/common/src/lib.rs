//! Generic resilience utilities for the Rallypoint client
//!
//! Domain-agnostic building blocks shared by the API client layer:
//!
//! - [`cache`] — in-memory TTL cache with lazy expiry
//! - [`dedupe`] — keyed in-flight request coalescing
//! - [`batch`] — short-window batching with bounded concurrency
//! - [`retry`] — exponential backoff with jitter and structural policies
//! - [`clock`] — time abstraction for deterministic tests
//!
//! Everything here is generic over value and error types; nothing in this
//! crate knows about HTTP or the Rallypoint backend.

pub mod batch;
pub mod cache;
pub mod clock;
pub mod dedupe;
pub mod retry;

pub use batch::{BatcherConfig, RequestBatcher};
pub use cache::{MobileCache, DEFAULT_TTL};
pub use clock::{Clock, MockClock, SystemClock};
pub use dedupe::RequestDeduplicator;
pub use retry::{retry_with_backoff, AlwaysRetry, PredicateRetry, RetryConfig, RetryPolicy};
