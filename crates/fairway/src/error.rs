//! Unified error type for the Fairway server.

use fairway_protocol::ProtocolError;
use fairway_room::RoomError;
use fairway_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FairwayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, not joinable).
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl FairwayError {
    /// Status code for the `error` message sent back to the client.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(_) => 400,
            Self::Room(e) => e.status_code(),
        }
    }
}
