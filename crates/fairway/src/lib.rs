//! # Fairway
//!
//! Server authority for a turn-based multiplayer mini-golf game.
//!
//! Clients simulate ball physics locally. The server owns everything
//! else: rooms, turn order, rounds and course generation. It relays each
//! shot and resting position to the rest of the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fairway::prelude::*;
//!
//! # async fn run() -> Result<(), FairwayError> {
//! let server = FairwayServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod handler;
mod hub;
pub mod relay;
mod server;

pub use error::FairwayError;
pub use server::{FairwayServer, FairwayServerBuilder, ServerConfig};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::relay::{Delivery, Effect};
    pub use crate::{FairwayError, FairwayServer, FairwayServerBuilder, ServerConfig};
    pub use fairway_course::{CourseLayout, Point};
    pub use fairway_protocol::{
        Channel, ClientEnvelope, ClientMessage, Codec, JsonCodec, PlayerId,
        PlayerView, RoomCode, ServerEnvelope, ServerMessage,
    };
    pub use fairway_room::{GameConfig, RoomError, RoomRegistry, RoomState};
}
