//! Error types for the room layer.

use fairway_protocol::{PlayerId, RoomCode};

use crate::RoomState;

/// Errors that can occur during room operations.
///
/// Every variant is scoped to one request: the room registry is left
/// untouched when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room has no free player slots.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room already left the waiting state.
    #[error("room {0} is {1} and cannot be joined")]
    NotJoinable(RoomCode, RoomState),

    /// The player already joined a room. One room per connection.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// Requested capacity is zero or above the configured maximum.
    #[error("capacity must be between 1 and {max}, got {requested}")]
    InvalidCapacity { requested: usize, max: usize },

    /// The display name is empty after trimming.
    #[error("display name must not be empty")]
    InvalidName,

    /// No unused room code was found within the retry budget.
    #[error("could not allocate a unique room code")]
    CodeSpaceExhausted,
}

impl RoomError {
    /// HTTP-style status code sent to the client alongside the message.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::RoomFull(_) | Self::NotJoinable(..) | Self::AlreadyInRoom(..) => 409,
            Self::InvalidCapacity { .. } | Self::InvalidName => 400,
            Self::CodeSpaceExhausted => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let code = RoomCode::parse("AB").unwrap();
        assert_eq!(RoomError::NotFound(code.clone()).status_code(), 404);
        assert_eq!(RoomError::RoomFull(code.clone()).status_code(), 409);
        assert_eq!(
            RoomError::NotJoinable(code, RoomState::Playing).status_code(),
            409
        );
        assert_eq!(RoomError::InvalidName.status_code(), 400);
        assert_eq!(RoomError::CodeSpaceExhausted.status_code(), 503);
    }

    #[test]
    fn test_messages_name_the_room() {
        let code = RoomCode::parse("K7QX2P").unwrap();
        let err = RoomError::NotJoinable(code, RoomState::Playing);
        assert_eq!(err.to_string(), "room K7QX2P is Playing and cannot be joined");
    }
}
