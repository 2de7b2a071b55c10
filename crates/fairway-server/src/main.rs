//! Fairway game server.
//!
//! ```text
//! fairway-server --port 3000 --max-rounds 9 --turn-timeout-secs 60
//! ```
//!
//! Every flag can also be set through the environment (`PORT`,
//! `FAIRWAY_HOST`, `FAIRWAY_MAX_ROUNDS`, ...). `RUST_LOG` takes precedence
//! over `--log-level`.

use std::time::Duration;

use clap::Parser;
use fairway::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, env = "FAIRWAY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Largest room a client may create
    #[arg(long, env = "FAIRWAY_MAX_CAPACITY", default_value_t = 4)]
    max_capacity: usize,

    /// Rounds per match; 0 plays until everyone leaves
    #[arg(long, env = "FAIRWAY_MAX_ROUNDS", default_value_t = 9)]
    max_rounds: u32,

    /// Pause before the next round is sent, in milliseconds
    #[arg(long, env = "FAIRWAY_ROUND_DELAY_MS", default_value_t = 3000)]
    round_delay_ms: u64,

    /// Seconds before an idle player's turn is skipped; 0 disables
    #[arg(long, env = "FAIRWAY_TURN_TIMEOUT_SECS", default_value_t = 60)]
    turn_timeout_secs: u64,

    /// Seconds without traffic before a connection is closed
    #[arg(long, env = "FAIRWAY_IDLE_TIMEOUT_SECS", default_value_t = 30)]
    idle_timeout_secs: u64,

    /// Count a player out of the round after `par` shots
    #[arg(long, env = "FAIRWAY_SHOT_BUDGET")]
    shot_budget: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "FAIRWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            max_capacity: self.max_capacity,
            max_rounds: (self.max_rounds > 0).then_some(self.max_rounds),
            round_advance_delay: Duration::from_millis(self.round_delay_ms),
            turn_timeout: (self.turn_timeout_secs > 0)
                .then(|| Duration::from_secs(self.turn_timeout_secs)),
            shot_budget: self.shot_budget,
            ..GameConfig::default()
        }
    }
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), FairwayError> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let game = args.game_config();
    tracing::info!(
        max_capacity = game.max_capacity,
        max_rounds = ?game.max_rounds,
        turn_timeout = ?game.turn_timeout,
        shot_budget = game.shot_budget,
        "starting Fairway"
    );

    let server = FairwayServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .game_config(game)
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs))
        .build()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
