//! HTTP server setup and management

use axum::{
    routing::get,
    Router,
};
use super::handlers::{AppState, accessory_info, health, metric, metrics, status};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/accessory", get(accessory_info))
        .route("/metrics", get(metrics))
        .route("/metrics/:name", get(metric))
        .with_state(app_state)
}

/// Start the HTTP server
pub async fn start(listen_addr: &str, port: u16, app_state: AppState) -> crate::Result<()> {
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", listen_addr, port)).await?;
    tracing::info!("HTTP exposition server listening on http://{}/metrics", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
