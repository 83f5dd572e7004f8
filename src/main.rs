//! News Aggregation Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//!
//! See `README.md` for quickstart and endpoint reference.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk::api::{router, AppState};
use newsdesk::auth;
use newsdesk::config::AppConfig;
use newsdesk::metrics::Metrics;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newsdesk=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let port = config.port;
    let metrics = Metrics::init(config.cache_ttl.as_secs());

    let state = AppState::from_config(config);

    // One-off admin account so a fresh deployment is immediately usable.
    auth::bootstrap_admin(state.users.as_ref(), &state.config).await?;

    let app = router(state).merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
