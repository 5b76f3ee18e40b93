//! HTTP request handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use super::models::{AccessoryResponse, ErrorResponse, MetricResponse, StatusResponse};
use crate::accessory::{self, AccessoryInfo};
use crate::telemetry::{Metric, TelemetryCache};

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct AppState {
    cache: TelemetryCache,
    accessory: AccessoryInfo,
}

impl AppState {
    pub fn new(cache: TelemetryCache, accessory: AccessoryInfo) -> Self {
        Self { cache, accessory }
    }
}

/// Health check endpoint
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pondsensors"
    }))
}

/// Cache status endpoint
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::new(
        &state.cache.config().source_address,
        state.cache.status(),
    ))
}

/// Accessory description endpoint
pub async fn accessory_info(State(state): State<AppState>) -> Json<AccessoryResponse> {
    Json(AccessoryResponse {
        info: state.accessory.clone(),
        services: accessory::services(),
    })
}

/// All metrics, read through one refresh cycle
pub async fn metrics(State(state): State<AppState>) -> Json<Vec<MetricResponse>> {
    let readings = state.cache.read_all().await;
    Json(
        readings
            .into_iter()
            .map(|(metric, reading)| MetricResponse::new(metric, reading))
            .collect(),
    )
}

/// Single metric endpoint
pub async fn metric(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MetricResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::info!("called read for {}", name);

    let metric = name.parse::<Metric>().map_err(|e| {
        tracing::error!("rejected read: {}", e);
        (StatusCode::NOT_FOUND, Json(ErrorResponse { error: e.to_string() }))
    })?;

    let reading = state.cache.read(metric).await;
    Ok(Json(MetricResponse::new(metric, reading)))
}
