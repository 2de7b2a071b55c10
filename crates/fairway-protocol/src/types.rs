//! Core protocol types for Fairway's wire format.
//!
//! Everything in here travels over the socket as JSON. Message enums are
//! internally tagged with a snake_case `type` field, so a join request
//! looks like:
//!
//! ```json
//! { "type": "join_room", "room_code": "K7QX2P", "name": "Ada" }
//! ```
//!
//! and is wrapped in an [`Envelope`] carrying sequencing metadata.

use std::fmt;
use std::str::FromStr;

use fairway_course::CourseLayout;
use fairway_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity: the id of the connection they play from.
///
/// There is no account system. The connection *is* the credential, so a
/// `PlayerId` lives exactly as long as the socket it was derived from.
///
/// Serialized as a plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

/// A short, human-typed room code such as `K7QX2P`.
///
/// Codes are ASCII alphanumeric and case-insensitive on input: whatever
/// the client sends is trimmed and upper-cased. Anything else fails to
/// deserialize, so a malformed code never reaches the room layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Longest code accepted from a client.
    pub const MAX_LEN: usize = 12;

    /// Validates and normalizes a raw code.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        let valid = !code.is_empty()
            && code.len() <= Self::MAX_LEN
            && code.bytes().all(|b| b.is_ascii_alphanumeric());
        if valid {
            Ok(Self(code))
        } else {
            Err(ProtocolError::InvalidMessage(format!(
                "invalid room code {raw:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Recipient / Channel
// ---------------------------------------------------------------------------

/// Who inside a room should receive a server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the given player, e.g. live position updates that
    /// the sender already simulated locally.
    AllExcept(PlayerId),
}

/// The delivery guarantee requested for a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss. Everything that changes game state.
    #[default]
    ReliableOrdered,

    /// Delivered, but possibly out of order.
    ReliableUnordered,

    /// May be lost or reordered. Live ball positions, where only the
    /// latest value matters.
    Unreliable,
}

// ---------------------------------------------------------------------------
// Player snapshot
// ---------------------------------------------------------------------------

/// A player as clients see it in lobby and turn updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// CSS color string assigned from the join-order palette.
    pub color: String,
    pub x: f32,
    pub y: f32,
    /// Holes completed across all rounds.
    pub score: u32,
    /// Whether the player has holed out this round.
    pub finished: bool,
    /// Shots taken this round.
    pub shots: u32,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// Gameplay messages name the room they are meant for. The server checks
/// that the sender belongs to that room and, for turn actions, that it is
/// their turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new room for `capacity` players.
    CreateRoom {
        #[serde(alias = "max_players")]
        capacity: u32,
    },

    /// Join a waiting room under a display name.
    JoinRoom { room_code: RoomCode, name: String },

    /// The active player struck the ball with this velocity.
    Shoot { room_code: RoomCode, vx: f32, vy: f32 },

    /// The active player's ball came to rest at `(x, y)`.
    TurnComplete { room_code: RoomCode, x: f32, y: f32 },

    /// The active player's ball dropped into the hole.
    HoleIn { room_code: RoomCode },

    /// Live position of the active player's rolling ball.
    SyncPosition { room_code: RoomCode, x: f32, y: f32 },

    /// Keep-alive. Echoed back with the server clock.
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection: who you are.
    Connected { player_id: PlayerId, server_time: u64 },

    /// Reply to `create_room`.
    RoomCreated { room_code: RoomCode },

    /// The waiting room's roster changed.
    UpdateLobby {
        room_code: RoomCode,
        capacity: usize,
        players: Vec<PlayerView>,
    },

    /// The room filled up and round 1 begins.
    GameStart {
        map: CourseLayout,
        players: Vec<PlayerView>,
        turn_id: PlayerId,
    },

    /// Someone took a shot; clients simulate it locally.
    PlayerShot { id: PlayerId, vx: f32, vy: f32 },

    /// Live position of another player's ball.
    PositionSync { id: PlayerId, x: f32, y: f32 },

    /// The turn passed to `turn_id`. `players` carries resting positions.
    ChangeTurn {
        turn_id: PlayerId,
        players: Vec<PlayerView>,
    },

    /// Everybody holed out; a new course begins.
    NextRound {
        map: CourseLayout,
        players: Vec<PlayerView>,
        turn_id: PlayerId,
    },

    /// The last round is over. No further turns will be accepted.
    GameOver {
        players: Vec<PlayerView>,
        winners: Vec<PlayerId>,
    },

    /// A player holed out.
    FinishedNotice {
        id: PlayerId,
        name: String,
        message: String,
    },

    /// Reply to `heartbeat`.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// A request was rejected. `code` follows HTTP conventions
    /// (400 bad request, 404 not found, 409 conflict, 503 unavailable).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level wrapper around every message on the wire.
///
/// The server numbers its outbound envelopes per connection and stamps
/// milliseconds since it started. Clients may omit `seq`, `timestamp` and
/// `channel`; they default to `0`, `0` and `ReliableOrdered`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    #[serde(default)]
    pub seq: u64,

    #[serde(default)]
    pub timestamp: u64,

    #[serde(default)]
    pub channel: Channel,

    pub payload: P,
}

/// What clients send.
pub type ClientEnvelope = Envelope<ClientMessage>;

/// What the server sends.
pub type ServerEnvelope = Envelope<ServerMessage>;

// =========================================================================
// Tests
// =========================================================================
