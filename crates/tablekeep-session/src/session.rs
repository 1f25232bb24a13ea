//! Session types: the client's view of who is logged in.
//!
//! A "session" here is the single authoritative record of the current
//! identity, as last confirmed by `GET /auth/me`. It tracks:
//! - WHO is logged in (`user`, or `None` for a confirmed logged-out state)
//! - HOW FAR that answer can be trusted (`load_state`)

use std::time::Duration;

use tablekeep_cache::{LoadState, QueryOptions, RetryPolicy};
use tablekeep_protocol::User;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the current-user resource.
///
/// Sensible defaults are provided; override only the fields you care
/// about with struct update syntax.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a confirmed identity is reused before `/auth/me` is asked
    /// again.
    ///
    /// Default: 5 minutes.
    pub stale_time: Duration,

    /// Retry policy for `/auth/me`.
    ///
    /// Default: never retry. A 401 is never retried anyway, but a
    /// network blip on the session check should surface promptly rather
    /// than hold every route guard in `Pending`.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            retry: RetryPolicy::none(),
        }
    }
}

impl SessionConfig {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new(self.stale_time).with_retry(self.retry.clone())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A snapshot of the current session.
///
/// ```text
///   Idle ──(read)──→ Loading ──(me ok)──→ Ready { user: Some }
///                       │
///                       ├──(me 401)──→ Ready { user: None }
///                       └──(me err)──→ Error
/// ```
///
/// `user` is only ever `Some` in the `Ready` state. While an identity is
/// being re-confirmed after login, signup, or an explicit refresh, the
/// session reports `Loading` with no user; the previous identity is not
/// trusted until the server answers again.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub user: Option<User>,
    pub load_state: LoadState,
}

impl Session {
    pub fn loading() -> Self {
        Self {
            user: None,
            load_state: LoadState::Loading,
        }
    }

    pub fn ready(user: Option<User>) -> Self {
        Self {
            user,
            load_state: LoadState::Ready,
        }
    }

    /// The current user could not be confirmed. Consumers treat this as
    /// logged out; the route guard redirects to login.
    pub fn error() -> Self {
        Self {
            user: None,
            load_state: LoadState::Error,
        }
    }

    /// Returns `true` when the server has confirmed a logged-in user.
    pub fn is_authenticated(&self) -> bool {
        self.load_state == LoadState::Ready && self.user.is_some()
    }

    /// Returns `true` while the answer is not known yet.
    pub fn is_pending(&self) -> bool {
        !self.load_state.is_settled()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}
