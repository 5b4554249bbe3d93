use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squad_wheel::{
    app, auth, broadcast,
    config::WheelConfig,
    state::{AppState, Roster},
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squad_wheel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Squad Wheel...");

    let config = WheelConfig::from_env();
    let auth_config = Arc::new(auth::AdminAuthConfig::from_env());
    let port = config.port;

    let state = if config.demo_roster {
        tracing::info!("Starting with the demo roster");
        Arc::new(AppState::with_roster(config, Roster::demo()))
    } else {
        Arc::new(AppState::new(config))
    };

    broadcast::spawn_snapshot_heartbeat(state.clone());

    let router = app::build_router(state, auth_config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
