//! Room registry: creates rooms, tracks which player is in which room.

use std::collections::HashMap;

use fairway_protocol::{PlayerId, RoomCode};

use crate::code::unique_code;
use crate::room::RoomRules;
use crate::{GameConfig, JoinOutcome, Room, RoomError};

/// Owns every room on the server.
///
/// Not thread-safe on its own; the server keeps it behind one lock and
/// holds that lock for each whole operation, so every room mutation is
/// atomic with respect to other connections.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Rooms by code. Rooms are never removed.
    rooms: HashMap<RoomCode, Room>,

    /// The room each player joined. A player joins at most one room.
    memberships: HashMap<PlayerId, RoomCode>,

    config: GameConfig,
}

impl RoomRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Opens a waiting room for `capacity` players.
    pub fn create_room(&mut self, capacity: usize) -> Result<RoomCode, RoomError> {
        if capacity == 0 || capacity > self.config.max_capacity {
            return Err(RoomError::InvalidCapacity {
                requested: capacity,
                max: self.config.max_capacity,
            });
        }

        let code = unique_code(&mut rand::rng(), |c| self.rooms.contains_key(c))?;
        let room = Room::new(code.clone(), capacity, RoomRules::from(&self.config));
        self.rooms.insert(code.clone(), room);
        tracing::info!(room_code = %code, capacity, "room created");
        Ok(code)
    }

    /// Seats `player` in the room under `name`.
    ///
    /// Checks run in order: already seated elsewhere, unknown room, bad
    /// name, then room full or started. Nothing changes on error. When the join fills the room, round 1 has
    /// already been laid out by the time this returns.
    pub fn join_room(
        &mut self,
        code: &RoomCode,
        player: PlayerId,
        name: &str,
    ) -> Result<JoinOutcome, RoomError> {
        if let Some(current) = self.memberships.get(&player) {
            return Err(RoomError::AlreadyInRoom(player, current.clone()));
        }
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let name = sanitize_name(name, self.config.max_name_len)
            .ok_or(RoomError::InvalidName)?;

        let outcome = room.add_player(player, name)?;
        self.memberships.insert(player, code.clone());
        Ok(outcome)
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// The room `player` joined, if any.
    pub fn room_of(&self, player: PlayerId) -> Option<&Room> {
        self.memberships
            .get(&player)
            .and_then(|code| self.rooms.get(code))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

/// Trims, strips control characters and truncates to `max_len` chars.
/// `None` if nothing is left.
fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let name: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect();
    let name = name.trim_end().to_string();
    (!name.is_empty()).then_some(name)
}
