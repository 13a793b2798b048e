//! Client configuration
//!
//! The base URL comes from the `EXPO_PUBLIC_BACKEND_API_URL` environment
//! variable (the contract shared with the app shell), defaulting to the
//! local development backend. Everything else is fixed constants with a
//! mobile profile that shortens the timeout ceiling and retry budget.

use std::time::Duration;

use rallypoint_common::retry::RetryConfig;
use url::Url;

use crate::error::{ApiError, ApiResult};

/// Environment variable carrying the backend base URL.
pub const BASE_URL_ENV: &str = "EXPO_PUBLIC_BACKEND_API_URL";

/// Fallback base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3005";

/// Request timeout ceiling on mobile profiles.
pub const MOBILE_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout ceiling elsewhere.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the cache janitor sweeps stale entries.
pub const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for [`ApiClient`](crate::api::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:3005`
    pub base_url: String,
    /// Whether this process runs under the constrained mobile profile
    pub mobile: bool,
    /// Request timeout ceiling
    pub timeout: Duration,
    /// Retry budget and backoff
    pub retry: RetryConfig,
    /// Default TTL for cached GET responses
    pub cache_ttl: Duration,
    /// TTL used instead when the link is classified slow
    pub slow_link_cache_ttl: Duration,
    /// Replay bound for background-sync items; `None` keeps retrying forever
    pub sync_max_attempts: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            mobile: false,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
            cache_ttl: Duration::from_secs(300),
            slow_link_cache_ttl: Duration::from_secs(600),
            sync_max_attempts: None,
        }
    }
}

impl ClientConfig {
    /// Resolve configuration from the environment
    ///
    /// Loads `.env` when present, then reads [`BASE_URL_ENV`], falling back
    /// to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> ApiResult<Self> {
        dotenvy::dotenv().ok();
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::default().with_base_url(base_url)
    }

    /// Replace the base URL, validating it parses as an absolute URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)
            .map_err(|err| ApiError::Config(format!("invalid base URL {base_url:?}: {err}")))?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Switch to the mobile profile: shorter timeout, fewer retries
    pub fn mobile(mut self) -> Self {
        self.mobile = true;
        self.timeout = MOBILE_TIMEOUT;
        self.retry = RetryConfig::mobile();
        self
    }

    /// Cap background-sync replays per item
    pub fn sync_max_attempts(mut self, attempts: u32) -> Self {
        self.sync_max_attempts = Some(attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_local_backend_and_desktop_profile() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.mobile);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.sync_max_attempts, None);
    }

    #[test]
    fn mobile_profile_shortens_timeout_and_retries() {
        let config = ClientConfig::default().mobile();
        assert!(config.mobile);
        assert_eq!(config.timeout, MOBILE_TIMEOUT);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn base_url_is_validated_and_normalized() {
        let config = ClientConfig::default()
            .with_base_url("https://api.rallypoint.example/")
            .unwrap();
        assert_eq!(config.base_url, "https://api.rallypoint.example");

        let err = ClientConfig::default().with_base_url("not a url").unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn slow_link_ttl_is_longer_than_default() {
        let config = ClientConfig::default();
        assert!(config.slow_link_cache_ttl > config.cache_ttl);
    }
}
