use core::net::SocketAddr;

use anyhow::{Context as _, Result};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::info;

fn router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Serves `GET /healthz` until the process exits.
pub(crate) async fn serve(addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding health endpoint to {addr}"))?;
    info!(addr = %listener.local_addr()?, "Health endpoint listening");
    axum::serve(listener, router())
        .await
        .context("health endpoint stopped")
}
