//! HTTP transport with error normalization
//!
//! Thin wrapper over `reqwest`: base URL joining, bearer-token injection,
//! connection-quality request hints, and normalization of every failure
//! mode into [`ApiError`]. The transport knows nothing about envelopes or
//! endpoints — the façade layers those on top.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connectivity::{ConnectionQuality, ConnectivityProbe};
use crate::error::{ApiError, ApiResult};

/// Body substring a 403 must carry to count as a session-expiry signal.
const INVALID_TOKEN_SIGNAL: &str = "Invalid or expired token";

/// Callback fired when the backend reports an invalid/expired token.
pub type UnauthorizedCallback = Arc<dyn Fn() + Send + Sync>;

/// HTTP transport for the Rallypoint backend
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    probe: Arc<dyn ConnectivityProbe>,
    token: RwLock<Option<String>>,
    on_unauthorized: RwLock<Option<UnauthorizedCallback>>,
}

impl Transport {
    /// Build a transport from configuration and a connectivity probe
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &ClientConfig, probe: Arc<dyn ConnectivityProbe>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            probe,
            token: RwLock::new(None),
            on_unauthorized: RwLock::new(None),
        })
    }

    /// Store the bearer token injected into subsequent requests
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Forget the bearer token
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Whether a bearer token is currently set
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Register the callback fired before an invalid/expired-token error
    /// propagates (typically clears session state and redirects to login)
    pub fn set_on_unauthorized(&self, callback: UnauthorizedCallback) {
        *self.on_unauthorized.write() = Some(callback);
    }

    /// Execute a request and return the parsed JSON body
    ///
    /// Non-2xx responses, timeouts, and connection failures all surface as
    /// the matching [`ApiError`] variant. A 204/205 yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "sending request");

        let mut builder = self.http.request(method.clone(), &url);

        if let Some(token) = self.token.read().as_deref() {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        if method == Method::GET {
            let quality = self.probe.quality();
            let max_age = match quality {
                ConnectionQuality::Slow => 600,
                ConnectionQuality::Fast | ConnectionQuality::Unknown => 300,
            };
            builder = builder.header("Cache-Control", format!("max-age={max_age}"));
            if let Some(value) = quality.header_value() {
                builder = builder.header("X-Connection-Quality", value);
            }
        }

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        debug!(%method, %url, %status, "received response");

        if status.is_success() {
            if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
                return Ok(Value::Null);
            }
            return response
                .json()
                .await
                .map_err(|err| ApiError::Decode(format!("invalid JSON response: {err}")));
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(self.normalize_error_response(status, &body_text))
    }

    /// Extract the most useful message from an error body and pick the
    /// matching variant, firing the unauthorized callback when the body
    /// carries the session-expiry signal.
    fn normalize_error_response(&self, status: StatusCode, body: &str) -> ApiError {
        let message = extract_error_message(status, body);

        if status == StatusCode::FORBIDDEN && message.contains(INVALID_TOKEN_SIGNAL) {
            warn!("backend reported an invalid or expired token");
            if let Some(callback) = self.on_unauthorized.read().as_ref() {
                callback();
            }
            return ApiError::Unauthorized(message);
        }

        ApiError::http(status.as_u16(), message)
    }
}

/// Message precedence: body `message`, body `error`, raw body, `HTTP <status>`
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(text) = parsed.get(field).and_then(Value::as_str) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    if body.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::connectivity::StaticProbe;

    async fn transport_for(server: &MockServer, probe: StaticProbe) -> Transport {
        let config = ClientConfig::default().with_base_url(server.uri()).unwrap();
        Transport::new(&config, Arc::new(probe)).unwrap()
    }

    #[tokio::test]
    async fn injects_bearer_token_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("Authorization", "Bearer member-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        transport.set_token("member-token");

        let result = transport.request(Method::GET, "/users/me", None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn get_requests_carry_quality_headers_on_slow_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(header("Cache-Control", "max-age=600"))
            .and(header("X-Connection-Quality", "slow"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            transport_for(&server, StaticProbe::with_state(true, Some("3g"))).await;
        let result = transport.request(Method::GET, "/events", None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_quality_omits_the_quality_header_but_keeps_cache_control() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(header("Cache-Control", "max-age=300"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        let result = transport.request(Method::GET, "/events", None).await;
        assert!(result.is_ok());

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("X-Connection-Quality"));
    }

    #[tokio::test]
    async fn error_message_prefers_body_message_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "Member not found"})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        let err = transport.request(Method::GET, "/users/99", None).await.unwrap_err();
        assert_eq!(err, ApiError::http(404, "Member not found"));
    }

    #[tokio::test]
    async fn error_message_falls_back_to_error_field_then_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"error": "boom"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(500).set_body_string("plain text failure"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/c"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;

        let err = transport.request(Method::GET, "/a", None).await.unwrap_err();
        assert_eq!(err, ApiError::http(500, "boom"));

        let err = transport.request(Method::GET, "/b", None).await.unwrap_err();
        assert_eq!(err, ApiError::http(500, "plain text failure"));

        let err = transport.request(Method::GET, "/c", None).await.unwrap_err();
        assert_eq!(err, ApiError::http(502, "HTTP 502"));
    }

    #[tokio::test]
    async fn forbidden_with_token_signal_fires_callback_before_erroring() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                serde_json::json!({"message": "Invalid or expired token"}),
            ))
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        transport.set_on_unauthorized(Arc::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let err = transport.request(Method::GET, "/users/me", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn plain_forbidden_does_not_fire_callback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"message": "Admins only"})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();
        transport.set_on_unauthorized(Arc::new(move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let err = transport.request(Method::GET, "/admin", None).await.unwrap_err();
        assert_eq!(err, ApiError::http(403, "Admins only"));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn connection_refused_normalizes_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so requests fail with ECONNREFUSED

        let config =
            ClientConfig::default().with_base_url(format!("http://{addr}")).unwrap();
        let transport = Transport::new(&config, Arc::new(StaticProbe::new())).unwrap();

        let err = transport.request(Method::GET, "/events", None).await.unwrap_err();
        assert_eq!(err, ApiError::Network);
    }

    #[tokio::test]
    async fn slow_response_normalizes_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let mut config = ClientConfig::default().with_base_url(server.uri()).unwrap();
        config.timeout = Duration::from_millis(50);
        let transport = Transport::new(&config, Arc::new(StaticProbe::new())).unwrap();

        let err = transport.request(Method::GET, "/events", None).await.unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }

    #[tokio::test]
    async fn no_content_yields_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        let value = transport
            .request(Method::POST, "/auth/logout", Some(&serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn clear_token_stops_injection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let transport = transport_for(&server, StaticProbe::new()).await;
        transport.set_token("t");
        assert!(transport.has_token());
        transport.clear_token();
        assert!(!transport.has_token());

        let _ = transport.request(Method::GET, "/events", None).await;
        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("Authorization"));
    }
}
