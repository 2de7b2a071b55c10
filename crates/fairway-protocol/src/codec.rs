//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server never calls `serde_json` directly; it goes through a
//! [`Codec`], so a compact binary format can be dropped in later without
//! touching the relay or the connection handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients speak JSON natively, and messages stay readable in
/// DevTools and logs.
///
/// ## Example
///
/// ```rust
/// use fairway_protocol::{ClientEnvelope, ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{"payload":{"type":"create_room","capacity":2}}"#;
///
/// let envelope: ClientEnvelope = codec.decode(bytes).unwrap();
/// assert_eq!(envelope.payload, ClientMessage::CreateRoom { capacity: 2 });
///
/// let round_trip: ClientEnvelope =
///     codec.decode(&codec.encode(&envelope).unwrap()).unwrap();
/// assert_eq!(round_trip, envelope);
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
}
