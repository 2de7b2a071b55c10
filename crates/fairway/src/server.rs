//! `FairwayServer` builder and server loop.
//!
//! This is the entry point for running a Fairway game server. It ties
//! together all the layers: transport → protocol → relay → rooms.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use fairway_protocol::JsonCodec;
use fairway_room::{GameConfig, RoomRegistry};
use fairway_transport::{Transport, TransportError, WebSocketTransport};

use crate::FairwayError;
use crate::handler::handle_connection;
use crate::hub::ConnectionHub;
use crate::relay::{self, Effect};

/// Server-wide settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `0.0.0.0:3000`.
    pub bind_addr: String,

    /// Rules for every room on this server.
    pub game: GameConfig,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            game: GameConfig::default(),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState {
    /// Held for the whole of each dispatch.
    pub(crate) rooms: tokio::sync::Mutex<RoomRegistry>,
    /// Never held across an `.await`.
    hub: Mutex<ConnectionHub>,
    pub(crate) codec: JsonCodec,
    pub(crate) idle_timeout: Duration,
    started: Instant,
}

impl ServerState {
    fn new(config: ServerConfig) -> Self {
        Self {
            rooms: tokio::sync::Mutex::new(RoomRegistry::new(config.game)),
            hub: Mutex::new(ConnectionHub::default()),
            codec: JsonCodec,
            idle_timeout: config.idle_timeout,
            started: Instant::now(),
        }
    }

    pub(crate) fn hub(&self) -> MutexGuard<'_, ConnectionHub> {
        self.hub.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Milliseconds since the server started.
    pub(crate) fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Carries out what the relay asked for.
    ///
    /// Call while still holding the registry lock so immediate deliveries
    /// are queued in the same order the room state changed.
    pub(crate) fn apply_effects(self: &Arc<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Deliver(delivery) => {
                    self.hub().deliver(delivery);
                }
                Effect::DeliverAfter { delay, delivery } => {
                    let state = Arc::clone(self);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        state.hub().deliver(delivery);
                    });
                }
                Effect::ArmTurnTimer {
                    room_code,
                    turn_seq,
                    after,
                } => {
                    let state = Arc::clone(self);
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let mut rooms = state.rooms.lock().await;
                        let effects =
                            relay::expire_turn(&mut rooms, &room_code, turn_seq);
                        state.apply_effects(effects);
                    });
                }
            }
        }
    }
}

/// Builder for configuring and starting a Fairway server.
///
/// # Example
///
/// ```rust,no_run
/// use fairway::prelude::*;
///
/// # async fn run() -> Result<(), FairwayError> {
/// let server = FairwayServer::builder()
///     .bind("0.0.0.0:3000")
///     .game_config(GameConfig {
///         max_rounds: Some(3),
///         ..GameConfig::default()
///     })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct FairwayServerBuilder {
    config: ServerConfig,
}

impl FairwayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the game rules.
    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener. Call [`FairwayServer::run`] to start serving.
    pub async fn build(self) -> Result<FairwayServer, FairwayError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let state = Arc::new(ServerState::new(self.config));
        Ok(FairwayServer { transport, state })
    }
}

impl Default for FairwayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Fairway game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct FairwayServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl FairwayServer {
    /// Creates a new builder.
    pub fn builder() -> FairwayServerBuilder {
        FairwayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), FairwayError> {
        self.accept_loop().await
    }

    /// Runs the accept loop until `shutdown` resolves, then stops
    /// accepting. Connections already open keep their tasks.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), FairwayError>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            result = self.accept_loop() => result,
            () = shutdown => {
                tracing::info!("shutdown requested");
                Ok(())
            }
        };
        self.transport.shutdown().await?;
        result
    }

    async fn accept_loop(&mut self) -> Result<(), FairwayError> {
        tracing::info!(addr = %self.local_addr(), "Fairway server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(TransportError::Shutdown) => return Ok(()),
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
