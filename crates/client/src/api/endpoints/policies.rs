//! Policy document endpoints

use reqwest::Method;

use crate::api::types::{decode, encode, paginated, Paginated, PolicyDocument, PolicyUpdate};
use crate::api::ApiClient;
use crate::error::ApiResult;

impl ApiClient {
    /// `GET /policies?page=<n>` — paginated policy documents
    pub async fn policies(&self, page: u32) -> ApiResult<Paginated<PolicyDocument>> {
        let value = self.get_cached(&format!("/policies?page={page}")).await?;
        paginated(value, "policies")
    }

    /// `GET /policies/<id>` — a single policy document
    pub async fn policy(&self, id: u64) -> ApiResult<PolicyDocument> {
        let value = self.get_cached(&format!("/policies/{id}")).await?;
        decode(value)
    }

    /// `PUT /policies/<id>` — amend a policy document
    pub async fn update_policy(&self, id: u64, update: &PolicyUpdate) -> ApiResult<PolicyDocument> {
        let body = encode(update)?;
        let value = self.send(Method::PUT, &format!("/policies/{id}"), Some(body)).await?;
        self.invalidate_path(&format!("/policies/{id}"));
        decode(value)
    }
}
