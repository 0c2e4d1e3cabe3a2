//! Service entrypoint: tracing setup, configuration, optional database
//! hydration, then the axum server.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trt_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    if !config.auth.enabled() {
        tracing::warn!(
            "TRT_AUTH_TOKENS not set — running OPEN. Every caller acts as an implicit admin. \
             Do not expose this mode beyond local development."
        );
    }

    let db_pool = trt_api::db::init_pool()
        .await
        .context("database initialization failed")?;

    let port = config.port;
    let state = AppState::with_config(config, db_pool);

    if let Some(pool) = state.db_pool.clone() {
        trt_api::db::hydrate(&pool, &state)
            .await
            .context("failed to hydrate stores from database")?;
    }

    let app = trt_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "trt-api listening");
    axum::serve(listener, app)
        .await
        .context("server exited with error")?;

    Ok(())
}

/// Structured logging via `RUST_LOG`; JSON output when `TRT_LOG_JSON=true`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("TRT_LOG_JSON")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
