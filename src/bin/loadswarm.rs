//! Loadswarm CLI.
//!
//! Spins up a pool of synthetic clients against a server and runs until
//! every session stops on its own or an interrupt signal asks them all
//! to shut down.
//!
//! Usage:
//!   loadswarm http <host> <port>
//!   loadswarm socket <host> <port> <count> [max_delay]
//!   loadswarm websocket <host> <port> <count> [max_delay]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loadswarm::{ClientPool, PacingConfig, ServerEndpoint, TransportKind};

// ============================================================================
// Constants
// ============================================================================

/// How long an interrupt shutdown waits for sessions before aborting
/// the stragglers. Covers one socket read timeout or one full pacing
/// sleep of any variant.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(12);

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(name = "loadswarm")]
#[command(about = "Multi-protocol synthetic client load simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Seed for deterministic pacing and message bodies
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// One HTTP client POSTing PING to the server root
    Http {
        /// Server hostname or IP
        host: String,
        /// Server port
        port: u16,
    },

    /// Pool of persistent TCP socket clients exchanging JSON commands
    Socket {
        /// Server hostname or IP
        host: String,
        /// Server port
        port: u16,
        /// Number of concurrent clients
        count: usize,
        /// Maximum delay between messages, in seconds
        #[arg(default_value_t = 5)]
        max_delay: u64,
    },

    /// Pool of persistent WebSocket clients
    Websocket {
        /// Server hostname or IP
        host: String,
        /// Server port
        port: u16,
        /// Number of concurrent clients
        count: usize,
        /// Maximum delay between messages, in seconds
        #[arg(default_value_t = 10)]
        max_delay: u64,
    },
}

impl Command {
    /// Splits the subcommand into pool parameters.
    fn into_parts(self) -> (TransportKind, ServerEndpoint, PacingConfig, usize) {
        match self {
            Self::Http { host, port } => (
                TransportKind::Http,
                ServerEndpoint::new(host, port),
                PacingConfig::new(),
                1,
            ),
            Self::Socket {
                host,
                port,
                count,
                max_delay,
            } => (
                TransportKind::Socket,
                ServerEndpoint::new(host, port),
                PacingConfig::new().with_max_delay(max_delay),
                count,
            ),
            Self::Websocket {
                host,
                port,
                count,
                max_delay,
            } => (
                TransportKind::WebSocket,
                ServerEndpoint::new(host, port),
                PacingConfig::new().with_max_delay(max_delay),
                count,
            ),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    run(cli).await;
}

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let default = if debug {
        "loadswarm=debug"
    } else {
        "loadswarm=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

async fn run(cli: Cli) {
    let (kind, endpoint, pacing, count) = cli.command.into_parts();

    info!(
        endpoint = %endpoint,
        transport = %kind,
        count,
        max_delay = pacing.max_delay_secs(),
        "connecting to server"
    );

    let mut pool = match cli.seed {
        Some(seed) => ClientPool::spawn_seeded(kind, &endpoint, pacing, count, seed),
        None => ClientPool::spawn(kind, &endpoint, pacing, count),
    };

    let interrupted = tokio::select! {
        _ = pool.join_all() => false,
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        info!("interrupt received, closing clients");
        pool.shutdown_all();
        if !pool.join_all_timeout(SHUTDOWN_GRACE).await {
            warn!("some sessions did not stop in time and were aborted");
        }
    }

    info!("all clients closed, bye");
}
