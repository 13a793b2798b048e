//! News/feed endpoints

use reqwest::Method;
use serde_json::{json, Value};

use crate::api::types::{decode, encode, paginated, NewPost, Paginated, Post};
use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::sync::SyncPriority;

impl ApiClient {
    /// `GET /posts?page=<n>` — paginated news feed
    pub async fn posts(&self, page: u32) -> ApiResult<Paginated<Post>> {
        let value = self.get_cached(&format!("/posts?page={page}")).await?;
        paginated(value, "posts")
    }

    /// `GET /posts/<id>` — a single post
    pub async fn post(&self, id: u64) -> ApiResult<Post> {
        let value = self.get_cached(&format!("/posts/{id}")).await?;
        decode(value)
    }

    /// `POST /posts` — publish a post; deferred when offline
    pub async fn create_post(&self, post: &NewPost) -> ApiResult<Post> {
        let body = encode(post)?;
        let value =
            self.send_or_defer(Method::POST, "/posts", Some(body), SyncPriority::High).await?;
        decode(value)
    }

    /// `POST /posts/<id>/reactions` — react to a post; deferred when offline
    ///
    /// Reactions are the cheapest thing to lose, so they queue at low
    /// priority behind RSVPs and new posts.
    pub async fn react(&self, post_id: u64, reaction: &str) -> ApiResult<Value> {
        let body = json!({ "reaction": reaction });
        let value = self
            .send_or_defer(
                Method::POST,
                &format!("/posts/{post_id}/reactions"),
                Some(body),
                SyncPriority::Low,
            )
            .await?;
        self.invalidate_path(&format!("/posts/{post_id}"));
        Ok(value)
    }
}
