//! Membership application review endpoints
//!
//! Review lists skip the response cache: an admin acting on a stale list
//! would double-handle applications. Deduplication still applies.

use reqwest::Method;
use serde_json::json;

use crate::api::types::{decode, paginated, Paginated, PendingApplication};
use crate::api::ApiClient;
use crate::error::ApiResult;

impl ApiClient {
    /// `GET /applications/pending?page=<n>` — applications awaiting review
    pub async fn pending_applications(&self, page: u32) -> ApiResult<Paginated<PendingApplication>> {
        let value = self.get_fresh(&format!("/applications/pending?page={page}")).await?;
        paginated(value, "applications")
    }

    /// `POST /applications/<id>/approve` — admit the applicant
    pub async fn approve_application(&self, id: u64) -> ApiResult<PendingApplication> {
        let value = self.send(Method::POST, &format!("/applications/{id}/approve"), None).await?;
        decode(value)
    }

    /// `POST /applications/<id>/reject` — decline the applicant
    pub async fn reject_application(
        &self,
        id: u64,
        reason: Option<&str>,
    ) -> ApiResult<PendingApplication> {
        let body = reason.map(|reason| json!({ "reason": reason }));
        let value = self.send(Method::POST, &format!("/applications/{id}/reject"), body).await?;
        decode(value)
    }
}
