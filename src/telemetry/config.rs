use std::collections::HashMap;
use std::time::Duration;
use url::Url;
use crate::telemetry::errors::ConfigurationError;
use crate::telemetry::metric::{Fallback, Metric};

/// Immutable parameters of a telemetry cache
///
/// Built once at startup with [`TelemetryConfig::new`], then refined with
/// the `with_*` builders before being handed to the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Normalized sensor URL
    pub source_address: String,

    /// Subtracted from the raw air temperature
    pub correction_offset: f64,

    /// Distance from the ultrasound sensor to an empty pond bottom
    pub reference_distance: f64,

    /// Hard limit for one fetch attempt
    pub timeout: Duration,

    /// Extra fetch attempts within one refresh cycle
    pub retries: u32,

    /// Reads within this window after a successful fetch are answered
    /// without a new fetch; zero refreshes on every read
    pub max_age: Duration,

    fallbacks: HashMap<Metric, Fallback>,
}

impl TelemetryConfig {
    pub fn new(
        source_address: &str,
        correction_offset: f64,
        reference_distance: f64,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let source_address = normalize_address(source_address)?;

        if !correction_offset.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "correction_offset",
                reason: format!("{} is not a finite number", correction_offset),
            });
        }
        if !reference_distance.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "reference_distance",
                reason: format!("{} is not a finite number", reference_distance),
            });
        }
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidParameter {
                name: "timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            source_address,
            correction_offset,
            reference_distance,
            timeout,
            retries: 0,
            max_age: Duration::ZERO,
            fallbacks: HashMap::new(),
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_fallback(mut self, metric: Metric, fallback: Fallback) -> Result<Self, ConfigurationError> {
        if let Fallback::Fixed(value) = fallback {
            if !value.is_finite() {
                return Err(ConfigurationError::InvalidParameter {
                    name: "fallback",
                    reason: format!("{} for {} is not a finite number", value, metric),
                });
            }
        }
        self.fallbacks.insert(metric, fallback);
        Ok(self)
    }

    /// Fallback policy of `metric`, [`Fallback::LastKnown`] unless configured
    pub fn fallback(&self, metric: Metric) -> Fallback {
        self.fallbacks.get(&metric).copied().unwrap_or_default()
    }
}

/// Accepts bare hosts such as `192.168.1.7` and turns them into HTTP URLs
fn normalize_address(address: &str) -> Result<String, ConfigurationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConfigurationError::InvalidSourceAddress("empty address".to_string()));
    }

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConfigurationError::InvalidSourceAddress(format!("{}: {}", address, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigurationError::InvalidSourceAddress(format!(
                "unsupported scheme {} in {}",
                other, address
            )));
        }
    }
    if url.host_str().is_none_or(|h| h.is_empty()) {
        return Err(ConfigurationError::InvalidSourceAddress(format!("no host in {}", address)));
    }

    Ok(url.to_string())
}
