//! Wire payload types for the Rallypoint backend
//!
//! The backend wraps responses in a `{ success, message?, data }` envelope
//! (sometimes twice); the façade strips that before these types ever see the
//! payload. List endpoints nest pagination metadata inside `data`, so lists
//! deserialize through [`paginated`] rather than a plain `Vec`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// A member account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub membership_status: Option<String>,
}

/// An organizing event members can RSVP to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub rsvp_count: u32,
    /// Whether the current user has RSVP'd
    #[serde(default)]
    pub attending: bool,
}

/// A news/feed post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub reaction_count: u32,
}

/// A membership application awaiting review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApplication {
    pub id: u64,
    pub applicant: User,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// An organizational policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Credentials for [`login`](crate::api::ApiClient::login)
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for [`register`](crate::api::ApiClient::register)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Invite/access code, when registration is gated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

/// Successful authentication payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Partial update for a member account; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Payload for [`create_post`](crate::api::ApiClient::create_post)
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

/// Partial update for a policy document
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Page metadata the backend nests next to each list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

/// A page of items plus its pagination metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: PageInfo,
}

/// Deserialize `value` into `T`, mapping failures to [`ApiError::Decode`]
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Serialize a request payload to JSON
pub(crate) fn encode<T: Serialize>(payload: &T) -> ApiResult<Value> {
    serde_json::to_value(payload)
        .map_err(|err| ApiError::Config(format!("unserializable request payload: {err}")))
}

/// Split a list payload of shape `{ "<key>": [...], "pagination": {...} }`
///
/// A missing `pagination` object degrades to a single synthetic page, which
/// some older endpoints still return.
pub(crate) fn paginated<T: DeserializeOwned>(mut value: Value, key: &str) -> ApiResult<Paginated<T>> {
    let raw_items = value.get_mut(key).map(Value::take).unwrap_or(Value::Array(Vec::new()));
    let raw_page = value.get_mut("pagination").map(Value::take);

    let items: Vec<T> = decode(raw_items)?;
    let page = match raw_page {
        Some(raw) => decode(raw)?,
        None => PageInfo {
            page: 1,
            limit: items.len() as u32,
            total: items.len() as u64,
            total_pages: 1,
        },
    };

    Ok(Paginated { items, page })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn paginated_splits_items_and_metadata() {
        let value = json!({
            "users": [
                {"id": 1, "email": "a@rallypoint.example", "firstName": "Ada", "lastName": "L"},
            ],
            "pagination": {"page": 2, "limit": 20, "total": 41, "totalPages": 3},
        });

        let page: Paginated<User> = paginated(value, "users").unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].email, "a@rallypoint.example");
        assert_eq!(page.page.page, 2);
        assert_eq!(page.page.total_pages, 3);
    }

    #[test]
    fn missing_pagination_degrades_to_a_single_page() {
        let value = json!({
            "policies": [
                {"id": 7, "title": "Code of Conduct", "content": "Be kind."},
            ],
        });

        let page: Paginated<PolicyDocument> = paginated(value, "policies").unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page.page, 1);
        assert_eq!(page.page.total, 1);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let value = json!({
            "id": 3,
            "email": "b@rallypoint.example",
            "firstName": "Grace",
            "lastName": "H",
            "lastSeenAt": "2026-08-01T10:00:00Z",
        });

        let user: User = decode(value).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.role, None);
    }

    #[test]
    fn user_update_serializes_only_set_fields() {
        let update = UserUpdate { first_name: Some("Ada".to_string()), ..UserUpdate::default() };
        let value = encode(&update).unwrap();
        assert_eq!(value, json!({"firstName": "Ada"}));
    }
}
