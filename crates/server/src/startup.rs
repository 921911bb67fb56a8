use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use service::{runtime, StorageEngine};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))
}

/// Router over an already built engine.
pub fn app(engine: StorageEngine) -> Router {
    routes::build_router(engine, build_cors())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}

/// Public entry: build storage, then serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let addr = bind_addr(&cfg)?;
    runtime::ensure_env(&cfg.storage).await?;

    // a storage engine that cannot load must keep the process from serving
    let engine = StorageEngine::from_config(&cfg.storage).await?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    info!(%addr, backend = ?engine.backend(), "hbnb api listening");
    axum::serve(listener, app(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}
