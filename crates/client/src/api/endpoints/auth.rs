//! Authentication endpoints

use reqwest::Method;
use tracing::info;

use crate::api::types::{decode, encode, AuthResponse, LoginRequest, RegisterRequest, User};
use crate::api::ApiClient;
use crate::error::ApiResult;

impl ApiClient {
    /// `POST /auth/login` — authenticate and store the session token
    ///
    /// Cached responses from a previous session are dropped.
    pub async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse> {
        let body = encode(credentials)?;
        let value = self.send(Method::POST, "/auth/login", Some(body)).await?;
        let auth: AuthResponse = decode(value)?;

        self.transport().set_token(auth.token.clone());
        self.clear_cache();
        info!(user_id = auth.user.id, "logged in");
        Ok(auth)
    }

    /// `POST /auth/register` — create an account and store the session token
    pub async fn register(&self, registration: &RegisterRequest) -> ApiResult<AuthResponse> {
        let body = encode(registration)?;
        let value = self.send(Method::POST, "/auth/register", Some(body)).await?;
        let auth: AuthResponse = decode(value)?;

        self.transport().set_token(auth.token.clone());
        self.clear_cache();
        info!(user_id = auth.user.id, "registered");
        Ok(auth)
    }

    /// `POST /auth/logout` — end the session
    ///
    /// The local token and cache are cleared even when the backend call
    /// fails; the session is gone either way.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self.send(Method::POST, "/auth/logout", None).await;
        self.transport().clear_token();
        self.clear_cache();
        info!("logged out");
        result.map(|_| ())
    }

    /// `GET /auth/me` — the authenticated member
    pub async fn current_user(&self) -> ApiResult<User> {
        let value = self.get_cached("/auth/me").await?;
        decode(value)
    }
}
