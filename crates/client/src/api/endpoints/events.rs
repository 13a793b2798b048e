//! Event endpoints
//!
//! RSVPs are the calls members most often make from a train platform, so
//! both directions opt into background sync: attempted offline, they are
//! queued and replayed on reconnect, and the caller's future resolves with
//! the replay's result.

use reqwest::Method;
use serde_json::Value;

use crate::api::types::{decode, paginated, Event, Paginated};
use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::sync::SyncPriority;

impl ApiClient {
    /// `GET /events?page=<n>` — paginated upcoming events
    pub async fn events(&self, page: u32) -> ApiResult<Paginated<Event>> {
        let value = self.get_cached(&format!("/events?page={page}")).await?;
        paginated(value, "events")
    }

    /// `GET /events/<id>` — a single event
    pub async fn event(&self, id: u64) -> ApiResult<Event> {
        let value = self.get_cached(&format!("/events/{id}")).await?;
        decode(value)
    }

    /// `POST /events/<id>/rsvp` — RSVP to an event; deferred when offline
    pub async fn rsvp(&self, event_id: u64) -> ApiResult<Value> {
        let value = self
            .send_or_defer(
                Method::POST,
                &format!("/events/{event_id}/rsvp"),
                None,
                SyncPriority::High,
            )
            .await?;
        self.invalidate_path(&format!("/events/{event_id}"));
        Ok(value)
    }

    /// `DELETE /events/<id>/rsvp` — withdraw an RSVP; deferred when offline
    pub async fn cancel_rsvp(&self, event_id: u64) -> ApiResult<Value> {
        let value = self
            .send_or_defer(
                Method::DELETE,
                &format!("/events/{event_id}/rsvp"),
                None,
                SyncPriority::Medium,
            )
            .await?;
        self.invalidate_path(&format!("/events/{event_id}"));
        Ok(value)
    }
}
