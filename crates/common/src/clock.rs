//! Clock abstraction
//!
//! Everything time-sensitive in this crate is a "how long since" question:
//! has a cached response outlived its TTL, when was a sync item enqueued.
//! Answering those against the real clock makes tests sleep through whole
//! TTL windows, so the cache and queues take a [`Clock`] instead.
//! Production wiring passes [`SystemClock`]; tests pass [`MockClock`] and
//! move time forward by hand.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync + 'static {
    /// Monotonic instant, the basis for TTL arithmetic
    fn now(&self) -> Instant;

    /// Wall-clock time, for enqueue timestamps
    fn system_time(&self) -> SystemTime;

    /// Wall-clock milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// The operating system's clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Hand-advanced clock for expiry tests
///
/// Frozen at construction; only [`advance`](MockClock::advance) moves it.
/// Clones share one elapsed offset, so a cache under test and the test
/// driving it observe the same timeline.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// A clock frozen at the moment of construction
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Move time forward by whole milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Total time advanced so far
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + *self.elapsed.lock()
    }
}
