//! Observable state of cached resources.

use std::fmt;

use tablekeep_protocol::ApiError;
use tokio::time::Instant;

use crate::QueryKey;

/// Lifecycle of one cached resource.
///
/// ```text
/// Idle ──(read)──→ Loading ──(ok)──→ Ready
///                     │
///                     └──(err)──→ Error ──(read)──→ Loading
/// ```
///
/// `Loading` is only reported while no value has ever been stored; a
/// re-fetch of a resource that already has a value keeps it `Ready` and
/// sets [`QueryState::fetching`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl LoadState {
    /// Returns `true` once a fetch has settled (successfully or not).
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Ready => write!(f, "Ready"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A point-in-time view of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub status: LoadState,
    /// Explicitly invalidated since the last successful fetch. The stored
    /// value, if any, must not be served.
    pub invalidated: bool,
    /// A fetch for this key is in flight.
    pub fetching: bool,
    /// When the stored value was fetched or reset.
    pub updated_at: Option<Instant>,
    /// The error of the last failed fetch, cleared by the next success.
    pub error: Option<ApiError>,
}

/// Something happened to a cache entry.
///
/// Broadcast to every [`QueryCache::subscribe`](crate::QueryCache::subscribe)
/// receiver, in the order the cache performed the changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A fetch started (joining an existing fetch doesn't emit).
    Fetching(QueryKey),
    /// A fetch completed and its value was stored.
    Fetched(QueryKey),
    /// A fetch failed and the entry moved to `Error`.
    Failed(QueryKey),
    /// The entry was marked stale.
    Invalidated(QueryKey),
    /// The entry was replaced without a fetch.
    Reset(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Fetching(key)
            | Self::Fetched(key)
            | Self::Failed(key)
            | Self::Invalidated(key)
            | Self::Reset(key) => key,
        }
    }
}
