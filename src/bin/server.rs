//! Room-based chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --redis-url redis://localhost:6379/0 \
//!     --database-url "sqlite:messages.db?mode=rwc"
//! ```
//!
//! Without `--redis-url` the relay runs in single-process mode over
//! in-memory stores and an in-process channel; with it, several processes
//! can serve the same logical rooms.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use sala::{
    common::logger::setup_logger,
    config::{FailPolicy, RateLimitConfig, RelayConfig},
    domain::{MessageArchive, PresenceTracker, RateLimiter, RecentHistory, RoomPubSub},
    infrastructure::{
        fanout::{RoomBroadcastBridge, SessionManager},
        inmemory::{
            InMemoryMessageArchive, InMemoryPresenceTracker, InMemoryRateLimiter,
            InMemoryRecentHistory, InProcessPubSub,
        },
        redis::{RedisPresenceTracker, RedisRateLimiter, RedisRecentHistory, RedisRoomPubSub},
        sqlite::SqliteMessageArchive,
    },
    ui::Server,
    usecase::{JoinRoomUseCase, LeaveRoomUseCase, ListOnlineUseCase, PublishMessageUseCase},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Room-based WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Redis URL for rate counters, history, presence and pub/sub.
    /// Omit to run single-process over in-memory stores.
    #[arg(long)]
    redis_url: Option<String>,

    /// SQLite URL for the durable message archive.
    /// Omit to keep archived messages in memory only.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum admitted messages per user per rate window
    #[arg(long, default_value = "5")]
    rate_limit: usize,

    /// Rate window duration in seconds
    #[arg(long, default_value = "1")]
    rate_window_secs: u64,

    /// Admit messages when the rate-limit store is unavailable
    #[arg(long)]
    fail_open: bool,

    /// Messages kept per room in the recent-history cache
    #[arg(long, default_value = "50")]
    history_capacity: usize,

    /// Seconds of inactivity before a user drops off the online roster
    #[arg(long, default_value = "60")]
    presence_ttl_secs: u64,

    /// Do not echo a sender's own messages back to them
    #[arg(long)]
    no_echo: bool,
}

impl Args {
    fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(self.rate_window_secs),
                max_events: self.rate_limit,
                on_store_error: if self.fail_open {
                    FailPolicy::FailOpen
                } else {
                    FailPolicy::FailClosed
                },
            },
            history_capacity: self.history_capacity,
            presence_ttl: Duration::from_secs(self.presence_ttl_secs),
            echo_to_sender: !self.no_echo,
            ..RelayConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.relay_config();

    // Backing stores: Redis-backed when a URL is given, in-memory otherwise.
    let (limiter, history, presence, pubsub): (
        Arc<dyn RateLimiter>,
        Arc<dyn RecentHistory>,
        Arc<dyn PresenceTracker>,
        Arc<dyn RoomPubSub>,
    ) = match &args.redis_url {
        Some(url) => {
            let client = match redis::Client::open(url.as_str()) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!("invalid redis url: {e}");
                    std::process::exit(1);
                }
            };
            let conn = match client.get_multiplexed_tokio_connection().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!("failed to connect to redis: {e}");
                    std::process::exit(1);
                }
            };
            tracing::info!("using redis backing stores at {url}");
            (
                Arc::new(RedisRateLimiter::new(
                    conn.clone(),
                    config.rate_limit.window,
                    config.rate_limit.max_events,
                )),
                Arc::new(RedisRecentHistory::new(
                    conn.clone(),
                    config.history_capacity,
                )),
                Arc::new(RedisPresenceTracker::new(
                    conn.clone(),
                    config.presence_ttl,
                )),
                Arc::new(RedisRoomPubSub::new(client, conn)),
            )
        }
        None => {
            tracing::info!("no redis url given, running single-process in-memory stores");
            (
                Arc::new(InMemoryRateLimiter::new(
                    config.rate_limit.window,
                    config.rate_limit.max_events,
                )),
                Arc::new(InMemoryRecentHistory::new(config.history_capacity)),
                Arc::new(InMemoryPresenceTracker::new(config.presence_ttl)),
                Arc::new(InProcessPubSub::new()),
            )
        }
    };

    let archive: Arc<dyn MessageArchive> = match &args.database_url {
        Some(url) => match SqliteMessageArchive::connect(url).await {
            Ok(archive) => {
                tracing::info!("archiving messages to {url}");
                Arc::new(archive)
            }
            Err(e) => {
                tracing::error!("failed to open message archive: {e}");
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("no database url given, archiving messages in memory");
            Arc::new(InMemoryMessageArchive::new())
        }
    };

    // Local fan-out: session registry and the per-room broadcast bridge.
    let sessions = Arc::new(SessionManager::new(config.echo_to_sender));
    let bridge = Arc::new(RoomBroadcastBridge::new(pubsub, sessions.clone()));

    // Usecases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        sessions.clone(),
        bridge.clone(),
        presence.clone(),
        history.clone(),
        config.store_timeout,
    ));
    let publish_message_usecase = Arc::new(PublishMessageUseCase::new(
        limiter,
        archive,
        history,
        presence.clone(),
        bridge.clone(),
        config.rate_limit.on_store_error,
        config.store_timeout,
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(sessions, bridge));
    let list_online_usecase = Arc::new(ListOnlineUseCase::new(presence, config.store_timeout));

    let server = Server::new(
        join_room_usecase,
        publish_message_usecase,
        leave_room_usecase,
        list_online_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
