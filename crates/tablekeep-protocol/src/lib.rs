//! Wire protocol for Tablekeep.
//!
//! This crate defines the "language" the reservation client and the REST
//! API speak:
//!
//! - **Types** ([`User`], [`Credentials`], [`SignupPayload`],
//!   [`AuthResponse`]) — the JSON bodies that travel on the wire.
//! - **Errors** ([`ApiError`], [`FieldError`], [`ErrorKind`]) — the
//!   uniform `{message, details?}` shape every failure is coerced into
//!   before it reaches UI code.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those bodies are
//!   converted to/from bytes.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It doesn't know about
//! HTTP, caching, or navigation — it only knows what the messages look
//! like.
//!
//! ```text
//! Transport (HTTP) → Protocol (User, ApiError) → Cache → Session → Router
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod api_error;
mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use api_error::{
    ApiError, ErrorKind, FieldError, REQUEST_FAILED, UNEXPECTED_ERROR, UNREADABLE_ERROR,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{AuthResponse, Credentials, Role, SignupPayload, User, UserId};
