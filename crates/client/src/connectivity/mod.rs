//! Connectivity probes and online state tracking
//!
//! The platform's connectivity signals (`navigator.onLine`,
//! `navigator.connection.effectiveType` in the app shell) are bridged into
//! this layer through the [`ConnectivityProbe`] capability trait. Absence of
//! a signal degrades gracefully: assume online, quality unknown.

pub mod monitor;
pub mod probe;

pub use monitor::{OnlineMonitor, Subscription};
pub use probe::{classify_effective_type, ConnectionQuality, ConnectivityProbe, StaticProbe,
                SystemProbe};
