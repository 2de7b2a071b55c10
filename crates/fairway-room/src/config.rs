//! Game configuration and the room state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Rules shared by every room on a server.
///
/// Start from `GameConfig::default()` and override what you need:
///
/// ```rust
/// use std::time::Duration;
/// use fairway_room::GameConfig;
///
/// let config = GameConfig {
///     max_rounds: Some(3),
///     turn_timeout: Some(Duration::from_secs(20)),
///     ..GameConfig::default()
/// };
/// assert!(config.max_capacity >= 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Largest capacity a client may request for a new room.
    pub max_capacity: usize,

    /// Rounds in a match. `None` plays until the players leave.
    pub max_rounds: Option<u32>,

    /// Pause between the end of a round and the `next_round` broadcast,
    /// so clients can show the scoreboard.
    pub round_advance_delay: Duration,

    /// How long the active player may take before their turn is skipped.
    /// `None` waits forever.
    pub turn_timeout: Option<Duration>,

    /// When set, a player who has used `par` shots is out for the round
    /// (skipped in rotation, no score) even without holing out.
    pub shot_budget: bool,

    /// Display names are truncated to this many characters.
    pub max_name_len: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_capacity: 4,
            max_rounds: Some(9),
            round_advance_delay: Duration::from_secs(3),
            turn_timeout: Some(Duration::from_secs(60)),
            shot_budget: false,
            max_name_len: 16,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: accepting joins until capacity is reached.
/// - **Playing**: rounds are in progress; turn messages are accepted.
/// - **Finished**: the last configured round is over. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Playing,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if turn messages are accepted.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
