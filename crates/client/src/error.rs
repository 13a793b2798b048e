//! Typed client error
//!
//! Every failure surfacing from this layer is an [`ApiError`] with a
//! structural kind; retry and unauthorized handling match on variants, not
//! message substrings. The `Display` text keeps the user-facing wording the
//! UI shows verbatim.

use thiserror::Error;

/// Fixed message for calls attempted while offline without background sync.
pub const OFFLINE_MESSAGE: &str =
    "You appear to be offline. Please check your internet connection.";

/// Fixed message for requests that got no response at all.
pub const NETWORK_MESSAGE: &str = "Network error - please check your connection";

/// Fixed message for locally enforced timeouts.
pub const TIMEOUT_MESSAGE: &str = "Connection timeout - please try again";

/// Errors produced by the Rallypoint client layer
///
/// `Clone` is required so deduplicated callers can share a rejection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Call attempted while offline and not deferrable
    #[error("{OFFLINE_MESSAGE}")]
    Offline,

    /// Request was sent but no response came back
    #[error("{NETWORK_MESSAGE}")]
    Network,

    /// Local timeout fired before a response arrived
    #[error("{TIMEOUT_MESSAGE}")]
    Timeout,

    /// Server responded with a non-2xx status
    #[error("{message}")]
    Http {
        /// HTTP status code of the response
        status: u16,
        /// Message extracted from the response body, or `HTTP <status>`
        message: String,
    },

    /// 403 carrying the invalid/expired token signal
    #[error("{0}")]
    Unauthorized(String),

    /// Response body could not be deserialized
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Client was misconfigured (bad base URL, unbuildable HTTP client)
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Build the HTTP variant from a status and extracted body message
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Whether the retry loop should attempt this call again
    ///
    /// Timeouts, unreachable-network failures, and HTTP statuses outside
    /// 400/401/403 are transient. Client/auth errors, offline fast-fails,
    /// decode and config errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network | Self::Timeout => true,
            Self::Http { status, .. } => !matches!(status, 400 | 401 | 403),
            Self::Offline | Self::Unauthorized(_) | Self::Decode(_) | Self::Config(_) => false,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(403),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            // Sent (or failed to connect) with no usable response.
            Self::Network
        }
    }
}

/// Convenience alias used throughout the client crate
pub type ApiResult<T> = Result<T, ApiError>;
