//! Error types for the protocol layer.
//!
//! Each crate in Tablekeep defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization, not in
//! networking or session handling.
//!
//! Note that [`ApiError`](crate::ApiError) is *not* a protocol error: it
//! is a value the server (or the transport) produced and that the UI is
//! expected to render. `ProtocolError` means our own bytes were bad.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: a response body that isn't JSON, a missing `user`
    /// field, or a role the client doesn't know about.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level.
    ///
    /// For logical errors that pass deserialization but can't be used,
    /// e.g. an empty response where a body is required.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
