//! Member directory endpoints

use reqwest::Method;

use crate::api::types::{decode, encode, paginated, Paginated, User, UserUpdate};
use crate::api::ApiClient;
use crate::error::ApiResult;

impl ApiClient {
    /// `GET /users?page=<n>` — paginated member directory
    pub async fn users(&self, page: u32) -> ApiResult<Paginated<User>> {
        let value = self.get_cached(&format!("/users?page={page}")).await?;
        paginated(value, "users")
    }

    /// `GET /users/<id>` — a single member
    pub async fn user(&self, id: u64) -> ApiResult<User> {
        let value = self.get_cached(&format!("/users/{id}")).await?;
        decode(value)
    }

    /// `PUT /users/<id>` — update a member profile
    pub async fn update_user(&self, id: u64, update: &UserUpdate) -> ApiResult<User> {
        let body = encode(update)?;
        let value = self.send(Method::PUT, &format!("/users/{id}"), Some(body)).await?;
        self.invalidate_path(&format!("/users/{id}"));
        decode(value)
    }

    /// `DELETE /users/<id>` — remove a member
    pub async fn delete_user(&self, id: u64) -> ApiResult<()> {
        self.send(Method::DELETE, &format!("/users/{id}"), None).await?;
        self.invalidate_path(&format!("/users/{id}"));
        Ok(())
    }
}
