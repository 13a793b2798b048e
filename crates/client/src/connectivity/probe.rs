//! Link quality classification and the connectivity capability trait

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

/// Coarse link classification derived from the network-information hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionQuality {
    /// 2G/3G tier links
    Slow,
    /// 4G tier links
    Fast,
    /// No usable signal from the platform
    Unknown,
}

impl ConnectionQuality {
    /// Header value for `X-Connection-Quality`; `None` when unknown
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Slow => Some("slow"),
            Self::Fast => Some("fast"),
            Self::Unknown => None,
        }
    }
}

/// Classify an optional effective-link-type hint
///
/// Pure function of the hint: `slow-2g`/`2g`/`3g` map to [`Slow`],
/// `4g` to [`Fast`], anything else (or no hint at all) to [`Unknown`].
///
/// [`Slow`]: ConnectionQuality::Slow
/// [`Fast`]: ConnectionQuality::Fast
/// [`Unknown`]: ConnectionQuality::Unknown
pub fn classify_effective_type(effective_type: Option<&str>) -> ConnectionQuality {
    match effective_type {
        Some("slow-2g" | "2g" | "3g") => ConnectionQuality::Slow,
        Some("4g") => ConnectionQuality::Fast,
        _ => ConnectionQuality::Unknown,
    }
}

/// Capability interface over the platform's connectivity signals
///
/// Implementations must degrade gracefully when a signal is unavailable.
pub trait ConnectivityProbe: Send + Sync {
    /// Current platform-reported connectivity; assume online when unknown
    fn is_online(&self) -> bool;

    /// Raw effective-link-type hint (`"3g"`, `"4g"`, ...), if exposed
    fn effective_type(&self) -> Option<String>;

    /// Classified link quality
    fn quality(&self) -> ConnectionQuality {
        classify_effective_type(self.effective_type().as_deref())
    }
}

/// Probe for environments without platform connectivity signals
///
/// Reports online with unknown quality, the graceful-degradation default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ConnectivityProbe for SystemProbe {
    fn is_online(&self) -> bool {
        true
    }

    fn effective_type(&self) -> Option<String> {
        None
    }
}

/// Settable probe
///
/// Doubles as the deterministic fake for tests and as the bridge for host
/// apps that forward real platform signals into the client.
#[derive(Debug, Default)]
pub struct StaticProbe {
    offline: AtomicBool,
    effective_type: RwLock<Option<String>>,
}

impl StaticProbe {
    /// Create a probe reporting online with unknown quality
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a probe with explicit initial state
    pub fn with_state(online: bool, effective_type: Option<&str>) -> Self {
        let probe = Self::new();
        probe.set_online(online);
        probe.set_effective_type(effective_type);
        probe
    }

    /// Update the connectivity flag
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Update the effective-link-type hint
    pub fn set_effective_type(&self, effective_type: Option<&str>) {
        *self.effective_type.write() = effective_type.map(str::to_string);
    }
}

impl ConnectivityProbe for StaticProbe {
    fn is_online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    fn effective_type(&self) -> Option<String> {
        self.effective_type.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_tiers_classify_as_slow() {
        assert_eq!(classify_effective_type(Some("slow-2g")), ConnectionQuality::Slow);
        assert_eq!(classify_effective_type(Some("2g")), ConnectionQuality::Slow);
        assert_eq!(classify_effective_type(Some("3g")), ConnectionQuality::Slow);
    }

    #[test]
    fn four_g_classifies_as_fast() {
        assert_eq!(classify_effective_type(Some("4g")), ConnectionQuality::Fast);
    }

    #[test]
    fn missing_or_unrecognized_hints_are_unknown() {
        assert_eq!(classify_effective_type(None), ConnectionQuality::Unknown);
        assert_eq!(classify_effective_type(Some("5g")), ConnectionQuality::Unknown);
        assert_eq!(classify_effective_type(Some("")), ConnectionQuality::Unknown);
    }

    #[test]
    fn system_probe_degrades_to_online_unknown() {
        let probe = SystemProbe;
        assert!(probe.is_online());
        assert_eq!(probe.quality(), ConnectionQuality::Unknown);
    }

    #[test]
    fn static_probe_reflects_updates() {
        let probe = StaticProbe::with_state(true, Some("3g"));
        assert!(probe.is_online());
        assert_eq!(probe.quality(), ConnectionQuality::Slow);

        probe.set_online(false);
        probe.set_effective_type(Some("4g"));
        assert!(!probe.is_online());
        assert_eq!(probe.quality(), ConnectionQuality::Fast);
    }

    #[test]
    fn header_values() {
        assert_eq!(ConnectionQuality::Slow.header_value(), Some("slow"));
        assert_eq!(ConnectionQuality::Fast.header_value(), Some("fast"));
        assert_eq!(ConnectionQuality::Unknown.header_value(), None);
    }
}
