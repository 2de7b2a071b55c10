//! A single room: roster, lifecycle state and the current course.
//!
//! Turn handling lives in `turn.rs`; this file covers membership and the
//! `Waiting → Playing` transition.

use fairway_course::{CourseLayout, Point};
use fairway_protocol::{PlayerId, PlayerView, Recipient, RoomCode};

use crate::{GameConfig, Player, RoomError, RoomState};

/// The subset of [`GameConfig`] a room needs once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoomRules {
    pub max_rounds: Option<u32>,
    pub shot_budget: bool,
}

impl From<&GameConfig> for RoomRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            max_rounds: config.max_rounds,
            shot_budget: config.shot_budget,
        }
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The join filled the room and round 1 has begun.
    pub started: bool,
    /// Players in the room after the join.
    pub player_count: usize,
}

/// An isolated game session owned by the [`RoomRegistry`](crate::RoomRegistry).
#[derive(Debug)]
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) capacity: usize,
    /// Turn order is join order.
    pub(crate) players: Vec<Player>,
    pub(crate) state: RoomState,
    pub(crate) turn_index: usize,
    pub(crate) layout: Option<CourseLayout>,
    /// Bumped whenever a new turn begins. Turn timers carry the value
    /// they were armed with and do nothing if it has moved on.
    pub(crate) turn_seq: u64,
    pub(crate) rules: RoomRules,
}

impl Room {
    pub(crate) fn new(code: RoomCode, capacity: usize, rules: RoomRules) -> Self {
        Self {
            code,
            capacity,
            players: Vec::with_capacity(capacity),
            state: RoomState::Waiting,
            turn_index: 0,
            layout: None,
            turn_seq: 0,
            rules,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn turn_seq(&self) -> u64 {
        self.turn_seq
    }

    /// The current course, once the game has started.
    pub fn layout(&self) -> Option<&CourseLayout> {
        self.layout.as_ref()
    }

    /// The round being played, or `0` before the game starts.
    pub fn round(&self) -> u32 {
        self.layout.as_ref().map_or(0, |l| l.round)
    }

    /// The player whose turn it is. `None` unless the room is playing.
    pub fn active_player(&self) -> Option<&Player> {
        if !self.state.is_playing() {
            return None;
        }
        self.players.get(self.turn_index)
    }

    /// Returns `true` if `id` may act right now.
    pub fn is_active(&self, id: PlayerId) -> bool {
        self.active_player().is_some_and(|p| p.id == id)
    }

    /// Snapshots of every player, in turn order.
    pub fn views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// Resolves a [`Recipient`] against the current roster.
    pub fn recipients(&self, recipient: Recipient) -> Vec<PlayerId> {
        let ids = self.players.iter().map(|p| p.id);
        match recipient {
            Recipient::All => ids.collect(),
            Recipient::Player(id) => ids.filter(|p| *p == id).collect(),
            Recipient::AllExcept(excluded) => {
                ids.filter(|p| *p != excluded).collect()
            }
        }
    }

    /// Seats a player. Starts round 1 when this fills the room.
    ///
    /// Leaves the room untouched on error.
    pub(crate) fn add_player(
        &mut self,
        id: PlayerId,
        name: String,
    ) -> Result<JoinOutcome, RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::NotJoinable(self.code.clone(), self.state));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        let join_index = self.players.len();
        self.players.push(Player::new(id, name, join_index));
        tracing::info!(
            room_code = %self.code,
            player_id = %id,
            players = self.players.len(),
            capacity = self.capacity,
            "player joined"
        );

        let started = self.is_full();
        if started {
            self.start_game();
        }

        Ok(JoinOutcome {
            started,
            player_count: self.players.len(),
        })
    }

    fn start_game(&mut self) {
        self.state = RoomState::Playing;
        self.begin_round(1);
        tracing::info!(
            room_code = %self.code,
            players = self.players.len(),
            "game started"
        );
    }

    /// Lays out `round` and puts every ball on the tee. The first player
    /// in join order tees off.
    pub(crate) fn begin_round(&mut self, round: u32) {
        let layout = fairway_course::generate(round);
        let start: Point = layout.start;
        for player in &mut self.players {
            player.reset_for_round(start);
        }
        self.layout = Some(layout);
        self.turn_index = 0;
        self.turn_seq += 1;
    }
}
