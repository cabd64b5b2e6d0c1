//! feedwire gateway
//!
//! - WebSocket feeds: /v1/feeds/{topic}?format=json|zlib|msgpack
//! - Decode-once pipeline: WS Message -> magic-byte detect -> JSON value
//! - Tracing span per session
//! - Heartbeat ping + idle timeout, graceful drain on Ctrl-C

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use feedwire_core::error::{FeedError, Result};
use feedwire_gateway::{app_state::AppState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "feedwire-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(config::CONFIG_ENV).unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.into());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| FeedError::BadRequest(format!("gateway.listen must be a valid SocketAddr: {e}")))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "feedwire-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| FeedError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            state.metrics().set_draining();
            tracing::info!("draining");
        })
        .await
        .map_err(|e| FeedError::Internal(format!("server failed: {e}")))
}
