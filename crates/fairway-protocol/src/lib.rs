//! Wire protocol for Fairway.
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`RoomCode`], ...): the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how they become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! The protocol layer sits between the transport (raw bytes) and the
//! room layer (game state). It knows nothing about rooms or turns.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<ClientMessage>) → Relay → Rooms
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Channel, ClientEnvelope, ClientMessage, Envelope, PlayerId, PlayerView,
    Recipient, RoomCode, ServerEnvelope, ServerMessage,
};
