//! Identity-scoped resources read through the shared cache.
//!
//! These are the reads logout must purge: each is cached under its own
//! key next to the current user, and `SessionController::logout`
//! invalidates all of them.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tablekeep_cache::{QueryKey, QueryOptions, RetryPolicy};
use tablekeep_protocol::ProtocolError;

/// Cache keys and endpoints of the resource queries.
pub mod keys {
    pub const MY_RESERVATIONS: &str = "my-reservations";
    pub const OWNER_RESERVATIONS: &str = "owner-reservations";
    pub const UNOWNED_RESTAURANTS: &str = "unowned-restaurants";
}

/// An id the API sends as either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reservation as listed for its customer or its restaurant's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: ResourceId,
    pub restaurant_id: ResourceId,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`.
    pub time: String,
    pub persons: u32,
    /// `pending`, `confirmed`, `declined`, ...
    pub status: String,
}

impl Reservation {
    /// The restaurant's name, or `Restaurant #<id>` when the listing
    /// doesn't include it.
    pub fn restaurant_label(&self) -> String {
        match &self.restaurant_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Restaurant #{}", self.restaurant_id),
        }
    }
}

/// A restaurant summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// How one resource is read: where from, under which key, how fresh.
#[derive(Debug, Clone)]
pub struct ResourceQuery {
    pub key: QueryKey,
    pub path: &'static str,
    pub options: QueryOptions,
}

impl ResourceQuery {
    /// `GET /reservations/my-reservations` with the client defaults.
    pub fn my_reservations(stale_time: Duration, retry: RetryPolicy) -> Self {
        Self {
            key: QueryKey::new(keys::MY_RESERVATIONS),
            path: "/reservations/my-reservations",
            options: QueryOptions::new(stale_time).with_retry(retry),
        }
    }

    /// `GET /reservations/owner-reservations` with the client defaults.
    pub fn owner_reservations(stale_time: Duration, retry: RetryPolicy) -> Self {
        Self {
            key: QueryKey::new(keys::OWNER_RESERVATIONS),
            path: "/reservations/owner-reservations",
            options: QueryOptions::new(stale_time).with_retry(retry),
        }
    }

    /// `GET /unowned-restaurants`: changes rarely, never retried.
    pub fn unowned_restaurants() -> Self {
        Self {
            key: QueryKey::new(keys::UNOWNED_RESTAURANTS),
            path: "/unowned-restaurants",
            options: QueryOptions::new(Duration::from_secs(5 * 60)),
        }
    }
}

/// Decodes a list body: either a bare array or a `{"data": [...]}`
/// envelope. `null` (an empty body) is an empty list.
pub fn decode_list<T: DeserializeOwned>(body: serde_json::Value) -> Result<Vec<T>, ProtocolError> {
    let items = match body {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Object(mut envelope) => match envelope.remove("data") {
            Some(data) => data,
            None => {
                return Err(ProtocolError::InvalidMessage(
                    "list response has no `data` field".into(),
                ));
            }
        },
        other => other,
    };
    serde_json::from_value(items).map_err(ProtocolError::Decode)
}
