//! Transport layer for Fairway.
//!
//! The game server sees each client as an opaque, message-oriented byte
//! channel identified by a [`ConnectionId`]. Framing, the WebSocket
//! upgrade and ping/pong handling stay behind the [`Transport`] and
//! [`Connection`] traits.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{HANDSHAKE_TIMEOUT, WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Identifies one accepted connection for as long as it is open.
///
/// Ids are handed out in accept order starting at 1 and never reused
/// within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A source of new connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client that finished connecting.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Stops taking new connections. Open connections are unaffected.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// One client's message channel.
///
/// `send` and `recv` take `&self` and may run concurrently from different
/// tasks.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one whole message, reliably and in order.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next whole message.
    ///
    /// Returns `Ok(None)` when the peer closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Sends data that may be dropped or reordered, such as live ball
    /// positions.
    ///
    /// Defaults to reliable send. Transports with a datagram path should
    /// override this.
    async fn send_unreliable(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.send(data).await
    }

    /// Starts a clean close.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
