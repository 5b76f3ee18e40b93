//! Telemetry read-through cache and transform engine

pub mod cache;
pub mod config;
pub mod errors;
pub mod metric;

pub use cache::{CacheStatus, TelemetryCache};
pub use config::TelemetryConfig;
pub use errors::ConfigurationError;
pub use metric::{Fallback, Metric, MetricSpec, MetricTable, Reading, Transform};
