//! Keyed async resource cache for Tablekeep.
//!
//! Stores the results of server reads under fixed keys and decides when a
//! stored result may be served again. The session layer keeps exactly one
//! resource here that matters for authentication (the current user, under
//! [`QueryKey::current_user`]); every identity-scoped resource the app
//! reads lives alongside it so logout can purge them all at once.
//!
//! # Operations
//!
//! - [`QueryCache::read`] — get-or-fetch with a staleness window.
//!   Concurrent reads of one key share a single in-flight request.
//! - [`QueryCache::invalidate`] — mark stale; the next read re-fetches.
//! - [`QueryCache::reset`] — replace the value synchronously, no fetch.
//! - [`QueryCache::invalidate_all_except`] — mark every other key stale.
//!
//! # Ordering
//!
//! Every entry carries a generation number bumped on each fetch start,
//! invalidation, and reset. A fetch that completes after its generation
//! moved on is discarded, so a slow request can never overwrite a value
//! that was reset or invalidated while it was in flight.

mod cache;
mod config;
mod error;
mod key;
mod state;

pub use cache::QueryCache;
pub use config::{CacheConfig, QueryOptions, RetryPolicy};
pub use error::CacheError;
pub use key::QueryKey;
pub use state::{CacheEvent, LoadState, QueryState};
