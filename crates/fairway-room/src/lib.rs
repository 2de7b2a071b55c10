//! Rooms and turns for Fairway.
//!
//! A [`RoomRegistry`] owns every [`Room`]. Rooms fill up in the
//! [`RoomState::Waiting`] state, start automatically when the last seat is
//! taken, and then rotate turns among their players round by round until
//! the configured number of rounds has been played.
//!
//! Everything here is synchronous. The server wraps the registry in a lock
//! and turns the values returned from these methods into network messages.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms and seats players
//! - [`Room`]: roster, lifecycle state, current course and turn
//! - [`TurnOutcome`]: what happened when a turn ended
//! - [`GameConfig`]: rules shared by every room

mod code;
mod config;
mod error;
mod player;
mod registry;
mod room;
mod turn;

pub use code::{CODE_ALPHABET, CODE_LEN, MAX_CODE_ATTEMPTS, random_code, unique_code};
pub use config::{GameConfig, RoomState};
pub use error::RoomError;
pub use player::{PALETTE, Player};
pub use registry::RoomRegistry;
pub use room::{JoinOutcome, Room};
pub use turn::TurnOutcome;
