/// Integration tests for the HTTP exposition API
///
/// Drives the axum router directly with `tower::ServiceExt::oneshot`,
/// backed by a telemetry cache with a fixed payload.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use pondsensors::accessory::AccessoryInfo;
use pondsensors::fetcher::{FetchError, Fetcher, RawPayload};
use pondsensors::http::{server, AppState};
use pondsensors::telemetry::{Fallback, Metric, TelemetryCache, TelemetryConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Helper: sensor that reports no soil humidity
struct FixedFetcher;

#[async_trait]
impl Fetcher for FixedFetcher {
    async fn fetch(&self, _address: &str, _timeout: Duration) -> Result<RawPayload, FetchError> {
        Ok(RawPayload::new()
            .with_field("airtemperature", 22.5)
            .with_field("airhumidity", 61.0)
            .with_field("waterlevel", 30.0)
            .with_field("watertemperature", 18.0))
    }
}

/// Helper: sensor that is always down
struct DownFetcher;

#[async_trait]
impl Fetcher for DownFetcher {
    async fn fetch(&self, _address: &str, _timeout: Duration) -> Result<RawPayload, FetchError> {
        Err(FetchError::Connection("no route to host".to_string()))
    }
}

fn app(fetcher: Arc<dyn Fetcher>) -> axum::Router {
    let config = TelemetryConfig::new("192.168.1.7", 1.5, 100.0, Duration::from_millis(200))
        .unwrap()
        .with_fallback(Metric::SoilHumidity, Fallback::None)
        .unwrap();
    let cache = TelemetryCache::new(config, fetcher);
    server::router(AppState::new(cache, AccessoryInfo::new("Garden pond")))
}

/// Helper: GET `uri` and return status plus JSON body
async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_single_metric() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/metrics/waterLevel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metric"], "waterLevel");
    assert_eq!(body["value"], 70.0);
    assert_eq!(body["available"], true);
    assert_eq!(body["service"], "HumidifierDehumidifier");
    assert_eq!(body["characteristic"], "WaterLevel");

    let (_, body) = get_json(app(Arc::new(FixedFetcher)), "/metrics/air_temperature").await;
    assert_eq!(body["value"], 21.0);
    assert_eq!(body["unit"], "celsius");
}

#[tokio::test]
async fn test_missing_metric_is_reported_as_unavailable() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/metrics/soilHumidity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], Value::Null);
    assert_eq!(body["available"], false);
}

#[tokio::test]
async fn test_unknown_metric_is_not_found() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/metrics/pressure").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown metric: pressure");
}

#[tokio::test]
async fn test_all_metrics() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let metrics = body.as_array().unwrap();
    assert_eq!(metrics.len(), 5);
    assert_eq!(metrics[0]["metric"], "airTemperature");
    assert_eq!(metrics[0]["value"], 21.0);
    assert_eq!(metrics[4]["metric"], "waterTemperature");
    assert_eq!(metrics[4]["value"], 18.0);
}

#[tokio::test]
async fn test_status_records_outage() {
    let router = app(Arc::new(DownFetcher));

    let (_, body) = get_json(router.clone(), "/metrics/airHumidity").await;
    assert_eq!(body["available"], false);

    let (status, body) = get_json(router, "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "http://192.168.1.7/");
    assert_eq!(body["has_payload"], false);
    assert_eq!(body["refresh_in_flight"], false);
    assert_eq!(body["failure_count"], 1);
    assert_eq!(body["last_error"], "connection failed: no route to host");
}

#[tokio::test]
async fn test_accessory_description() {
    let (status, body) = get_json(app(Arc::new(FixedFetcher)), "/accessory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Garden pond");
    assert_eq!(body["manufacturer"], "Daniel Blank");
    assert_eq!(body["model"], "Pondsensor");
    assert_eq!(body["services"].as_array().unwrap().len(), 5);
    assert_eq!(body["services"][1]["service"], "HumiditySensor");
}
