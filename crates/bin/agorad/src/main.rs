//! # agorad: agora daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`agora.toml`, `AGORA_*` environment variables)
//! - Initialise `tracing` with an `EnvFilter`
//! - Initialise the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct application services, injecting repositories via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve until SIGINT/SIGTERM
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use agora_adapter_http_axum::state::AppState;
use agora_adapter_storage_sqlite_sqlx::{
    SqliteForumRepository, SqliteMatchRepository, SqliteReadMarkerRepository,
    SqliteUserRepository,
};
use agora_app::event_bus::InProcessEventBus;
use agora_app::policy::StandardPolicy;
use agora_app::services::match_service::MatchService;
use agora_app::services::moderation_service::ModerationService;
use agora_app::services::topic_service::TopicService;
use agora_app::services::user_service::UserService;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Database
    let db = agora_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(config.events.capacity));
    let mut events = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "forum event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "forum event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Services
    let topic_service = TopicService::new(
        SqliteForumRepository::new(pool.clone()),
        SqliteUserRepository::new(pool.clone()),
        SqliteReadMarkerRepository::new(pool.clone()),
        StandardPolicy,
        Arc::clone(&event_bus),
    );
    let moderation_service =
        ModerationService::new(SqliteForumRepository::new(pool.clone()), StandardPolicy);
    let match_service = MatchService::new(
        SqliteMatchRepository::new(pool.clone()),
        SqliteUserRepository::new(pool.clone()),
        StandardPolicy,
    );
    let user_service = UserService::new(SqliteUserRepository::new(pool));

    // HTTP
    let state = AppState::new(topic_service, moderation_service, match_service, user_service);
    let app = agora_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "agorad listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("agorad stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
