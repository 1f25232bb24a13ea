//! Per-operation progress: what login, signup, and logout are doing now.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tablekeep_protocol::ApiError;
use tokio::sync::watch;
use tracing::debug;

/// Where an operation is in its lifecycle.
///
/// ```text
///   Idle ──(call)──→ Pending ──(ok)──→ Success
///                       │
///                       └──(err)──→ Error
/// ```
///
/// Any state goes back to `Idle` on `reset_*`, and to `Pending` on the
/// next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Pending => write!(f, "Pending"),
            Self::Success => write!(f, "Success"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// The observable state of one operation.
///
/// `error` is set exactly when `status` is [`OperationStatus::Error`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationState {
    pub status: OperationStatus,
    pub error: Option<ApiError>,
}

impl OperationState {
    pub fn pending() -> Self {
        Self {
            status: OperationStatus::Pending,
            error: None,
        }
    }

    fn settled(result: &Result<(), ApiError>) -> Self {
        match result {
            Ok(()) => Self {
                status: OperationStatus::Success,
                error: None,
            },
            Err(err) => Self {
                status: OperationStatus::Error,
                error: Some(err.clone()),
            },
        }
    }

    /// Callers disable the submit trigger while this is `true`; double
    /// submits are not deduplicated.
    pub fn is_pending(&self) -> bool {
        self.status == OperationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }
}

/// Tracks one named operation across overlapping invocations.
///
/// Every call gets a sequence number from [`begin`](Self::begin). Only
/// the completion of the most recent call is published; an older call
/// that finishes late is logged and dropped. `reset` also advances the
/// sequence, so a call still in flight when its state was reset can't
/// bring back a stale `Success` or `Error`.
pub(crate) struct OperationTracker {
    name: &'static str,
    sequence: AtomicU64,
    state: watch::Sender<OperationState>,
}

impl OperationTracker {
    pub(crate) fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(OperationState::default());
        Self {
            name,
            sequence: AtomicU64::new(0),
            state,
        }
    }

    /// Marks the operation `Pending` and returns this call's id.
    pub(crate) fn begin(&self) -> u64 {
        let mut id = 0;
        self.state.send_modify(|state| {
            id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            *state = OperationState::pending();
        });
        id
    }

    /// Publishes the outcome of call `id`, unless a newer call or a reset
    /// happened since.
    pub(crate) fn finish(&self, id: u64, result: &Result<(), ApiError>) {
        let published = self.state.send_if_modified(|state| {
            if self.sequence.load(Ordering::SeqCst) != id {
                return false;
            }
            *state = OperationState::settled(result);
            true
        });
        if !published {
            debug!(operation = self.name, id, "ignoring completion of superseded call");
        }
    }

    pub(crate) fn reset(&self) {
        self.state.send_modify(|state| {
            self.sequence.fetch_add(1, Ordering::SeqCst);
            *state = OperationState::default();
        });
    }

    pub(crate) fn get(&self) -> OperationState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<OperationState> {
        self.state.subscribe()
    }
}
