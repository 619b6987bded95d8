//! Status endpoint for liveness checks.
//!
//! `/` answers with a fixed body for any method; every other path is a 404.

use axum::{routing::any, Router};
use tokio::net::TcpListener;
use tracing::info;

use crate::Result;

pub const STATUS_BODY: &str = "tipbot says hi";

pub fn router() -> Router {
    Router::new().route("/", any(|| async { STATUS_BODY }))
}

/// Bind the status listener on all interfaces.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("status endpoint listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router()).await?;
    Ok(())
}
