//! Rakugaki matchmaking server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rakugaki-server
//! cargo run --bin rakugaki-server -- --host 0.0.0.0 --port 3000 --shared-rooms a,b,c
//! ```

use std::{collections::HashMap, sync::Arc, time::Duration};

use clap::Parser;
use rakugaki_server::{
    config::ServerConfig,
    domain::{RoomRegistry, TopicCatalog, TopicResolver},
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::{AppState, Server},
};
use rakugaki_shared::{logger::setup_logger, time::SystemClock};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "rakugaki-server")]
#[command(about = "Matchmaking and judgment server for two-player drawing duels", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Comma-separated names of the shared rooms
    #[arg(long, value_delimiter = ',', default_value = "room1,room2,room3,room4")]
    shared_rooms: Vec<String>,

    /// Interval between matchmaking retries, in milliseconds
    #[arg(long, default_value = "50")]
    matchmaking_retry_ms: u64,

    /// Matchmaking retries before a waiting room is given up on
    #[arg(long, default_value = "600")]
    matchmaking_max_attempts: u32,

    /// Seconds a lone topic proposal waits for the peer's proposal
    #[arg(long, default_value = "10")]
    topic_timeout_secs: u64,

    /// Seconds a leaving participant has to confirm before the room is cleared
    #[arg(long, default_value = "60")]
    leave_grace_secs: u64,

    /// Seed for topic resolution (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            shared_rooms: args.shared_rooms,
            matchmaking_retry: Duration::from_millis(args.matchmaking_retry_ms),
            matchmaking_max_attempts: args.matchmaking_max_attempts,
            topic_timeout: Duration::from_secs(args.topic_timeout_secs),
            leave_grace: Duration::from_secs(args.leave_grace_secs),
            seed: args.seed,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let (host, port) = (args.host.clone(), args.port);
    let config = ServerConfig::from(args);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. AppState (UseCases)
    // 4. Server

    // 1. Create Repository (in-memory registry)
    let shared_rooms = match config.shared_room_names() {
        Ok(names) => names,
        Err(e) => {
            tracing::error!("Invalid shared room configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Shared rooms: {}",
        shared_rooms
            .iter()
            .map(|room| room.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    let registry = Arc::new(Mutex::new(RoomRegistry::new(shared_rooms)));
    let repository = Arc::new(InMemoryRoomRepository::new(registry));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_clients = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_clients));

    // 3. Create UseCases
    let resolver = Arc::new(TopicResolver::new(TopicCatalog::default(), config.seed));
    let state = Arc::new(AppState::new(
        repository,
        message_pusher,
        Arc::new(SystemClock),
        resolver,
        &config,
    ));

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(host, port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
