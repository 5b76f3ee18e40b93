//! HTTP API response models

use serde::Serialize;
use std::time::UNIX_EPOCH;
use crate::accessory::{AccessoryInfo, Characteristic, ServiceDescriptor, ServiceKind};
use crate::telemetry::{CacheStatus, Metric, Reading};

/// One metric reading
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MetricResponse {
    pub metric: &'static str,
    /// `null` when no data is available yet
    pub value: Option<f64>,
    pub available: bool,
    pub unit: &'static str,
    pub service: ServiceKind,
    pub characteristic: Characteristic,
}

impl MetricResponse {
    pub fn new(metric: Metric, reading: Reading) -> Self {
        let descriptor = ServiceDescriptor::for_metric(metric);
        Self {
            metric: metric.name(),
            value: reading.value(),
            available: reading.is_available(),
            unit: metric.unit(),
            service: descriptor.service,
            characteristic: descriptor.characteristic,
        }
    }
}

/// Cache state for observability
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub source: String,
    pub refresh_in_flight: bool,
    pub pending_waiters: usize,
    pub has_payload: bool,
    pub last_error: Option<String>,
    /// Unix seconds of the last successful fetch
    pub last_success_at: Option<u64>,
    pub refresh_count: u64,
    pub failure_count: u64,
}

impl StatusResponse {
    pub fn new(source: &str, status: CacheStatus) -> Self {
        Self {
            source: source.to_string(),
            refresh_in_flight: status.refresh_in_flight,
            pending_waiters: status.pending_waiters,
            has_payload: status.has_payload,
            last_error: status.last_error.map(|e| e.to_string()),
            last_success_at: status
                .last_success_at
                .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
            refresh_count: status.refresh_count,
            failure_count: status.failure_count,
        }
    }
}

/// Accessory information plus its services
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AccessoryResponse {
    #[serde(flatten)]
    pub info: AccessoryInfo,
    pub services: Vec<ServiceDescriptor>,
}

/// Error body
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}
