//! Session management for Tablekeep.
//!
//! This crate owns the client's answer to "who is logged in":
//!
//! 1. **The session** — a snapshot of the current user and how far it
//!    can be trusted ([`Session`])
//! 2. **The controller** — the only code that changes it, through
//!    login, signup, and logout ([`SessionController`])
//! 3. **Operation state** — what each of those calls is doing right now,
//!    for pending and error UI ([`OperationState`])
//! 4. **Form errors** — where a failure belongs on a form ([`FormErrors`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)  ← reads sessions to guard routes and pick redirects
//!     ↕
//! Session Layer (this crate)  ← pairs auth calls with cache mutations
//!     ↕
//! Cache + Transport (below)  ← stores `/auth/me`, talks to the API
//! ```

mod controller;
mod error;
mod form;
mod operation;
mod session;

pub use controller::{MISSING_FIELDS, SessionController};
pub use error::SessionError;
pub use form::FormErrors;
pub use operation::{OperationState, OperationStatus};
pub use session::{Session, SessionConfig};
