//! Cache configuration: staleness windows and retry policy.

use std::time::Duration;

use rand::Rng;
use tablekeep_protocol::{ApiError, ErrorKind};
use tracing::warn;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How a failed fetch is retried before the failure is stored.
///
/// Only transient failures are retried: no response at all, or a 5xx.
/// A 401 or a validation error is an answer, not a hiccup, and retrying
/// it would only delay the "logged out" decision.
///
/// Delays double per attempt starting at `base_delay`, capped at
/// `max_delay`, plus up to `max_jitter` of random spread so clients that
/// failed together don't retry together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. 0 = never retry.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self::retries(0)
    }

    /// Retry up to `max_retries` times with the default backoff
    /// (1 s, 2 s, 4 s, ... capped at 30 s).
    pub fn retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

        let jitter_us = u64::try_from(self.max_jitter.as_micros()).unwrap_or(u64::MAX);
        let jitter = if jitter_us == 0 {
            Duration::ZERO
        } else {
            Duration::from_micros(rand::rng().random_range(0..=jitter_us))
        };

        delay + jitter
    }

    /// Returns `true` if `err` may be retried under this policy.
    pub fn should_retry(&self, attempt: u32, err: &ApiError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match err.kind() {
            ErrorKind::Network => true,
            ErrorKind::Server => err.status.is_some_and(|s| s >= 500),
            ErrorKind::Unauthorized | ErrorKind::Validation => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

// ---------------------------------------------------------------------------
// QueryOptions
// ---------------------------------------------------------------------------

/// Per-read options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched value is served without re-fetching.
    /// `Duration::ZERO` means every read re-fetches.
    pub stale_time: Duration,
    pub retry: RetryPolicy,
}

impl QueryOptions {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Defaults applied by [`QueryCache::read`](crate::QueryCache::read).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Default: 60 seconds.
    pub default_stale_time: Duration,
    /// Default: no retries.
    pub default_retry: RetryPolicy,
    /// Capacity of the event broadcast channel. Slow subscribers that
    /// fall further behind than this see a `Lagged` error.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_stale_time: Duration::from_secs(60),
            default_retry: RetryPolicy::none(),
            event_capacity: 64,
        }
    }
}

impl CacheConfig {
    /// Upper bound on retries; anything above is clamped.
    pub const MAX_RETRIES: u32 = 10;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`QueryCache::new`](crate::QueryCache::new).
    pub fn validated(mut self) -> Self {
        if self.default_retry.max_retries > Self::MAX_RETRIES {
            warn!(
                retries = self.default_retry.max_retries,
                max = Self::MAX_RETRIES,
                "default_retry.max_retries exceeds maximum, clamping"
            );
            self.default_retry.max_retries = Self::MAX_RETRIES;
        }
        if self.event_capacity == 0 {
            self.event_capacity = 1;
        }
        self
    }

    pub fn default_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: self.default_stale_time,
            retry: self.default_retry.clone(),
        }
    }
}
