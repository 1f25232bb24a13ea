//! Request and response body encoding.
//!
//! `HttpTransport` is generic over [`Codec`]. The API speaks JSON, so
//! [`JsonCodec`] is the only implementation.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes request bodies and decodes response bodies.
///
/// Shared by every fetch the transport runs, hence `Send + Sync`.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// The `Content-Type` this codec produces.
    fn content_type(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// JSON bodies via `serde_json` (feature `json`, on by default).
///
/// ## Example
///
/// ```rust
/// use tablekeep_protocol::{Codec, Credentials, JsonCodec};
///
/// let codec = JsonCodec;
/// let creds = Credentials::new("ada@example.com", "s3cret!");
///
/// let bytes = codec.encode(&creds).unwrap();
/// let decoded: Credentials = codec.decode(&bytes).unwrap();
/// assert_eq!(creds, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
