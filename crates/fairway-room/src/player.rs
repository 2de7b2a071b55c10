//! A player's seat in a room.

use fairway_course::Point;
use fairway_protocol::{PlayerId, PlayerView};

/// Ball colors, assigned by join order: red, blue, yellow, purple.
pub const PALETTE: [&str; 4] = ["#e74c3c", "#3498db", "#f1c40f", "#9b59b6"];

/// A player in a room. Created on join and never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    /// Where the ball last came to rest.
    pub position: Point,
    /// Holes completed across all rounds.
    pub score: u32,
    /// Holed out this round.
    pub finished: bool,
    /// Shots taken this round.
    pub shots: u32,
}

impl Player {
    /// Creates the player who joined as number `join_index` (0-based).
    pub fn new(id: PlayerId, name: String, join_index: usize) -> Self {
        Self {
            id,
            name,
            color: PALETTE[join_index % PALETTE.len()],
            position: Point::default(),
            score: 0,
            finished: false,
            shots: 0,
        }
    }

    /// Puts the ball back on the tee for a new round.
    pub(crate) fn reset_for_round(&mut self, start: Point) {
        self.position = start;
        self.finished = false;
        self.shots = 0;
    }

    /// Out of the rotation for this round: holed out, or out of shots
    /// when a shot limit applies.
    pub fn is_done(&self, shot_limit: Option<u32>) -> bool {
        self.finished || shot_limit.is_some_and(|limit| self.shots >= limit)
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            color: self.color.to_string(),
            x: self.position.x,
            y: self.position.y,
            score: self.score,
            finished: self.finished,
            shots: self.shots,
        }
    }
}
