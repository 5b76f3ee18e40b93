//! Remote sensor retrieval
//!
//! A fetcher performs exactly one retrieval of the sensor payload and
//! decodes it into a [`RawPayload`]. Fetchers own no state across calls and
//! never retry: retry and coalescing policy belong to the telemetry cache.

pub mod errors;
pub mod http;

use std::collections::HashMap;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::Value;

pub use errors::FetchError;
pub use http::HttpFetcher;

/// Source of sensor payloads
///
/// Implementations must resolve within roughly `timeout` and report every
/// failure as a [`FetchError`] instead of panicking.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve and decode one payload from `address`
    async fn fetch(&self, address: &str, timeout: Duration) -> Result<RawPayload, FetchError>;
}

/// Decoded, untransformed field set from one successful fetch
///
/// Fields that were present but not numeric are kept as `None` so that
/// "missing" stays distinguishable from a real zero reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    fields: HashMap<String, Option<f64>>,
}

impl RawPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by scripted sources and tests
    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.insert(name, Some(value));
        self
    }

    pub fn insert(&mut self, name: &str, value: Option<f64>) {
        // NaN and infinities are never valid readings
        let value = value.filter(|v| v.is_finite());
        self.fields.insert(name.to_string(), value);
    }

    /// Numeric value of `name`, `None` when absent or unparseable
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decode a response body
    ///
    /// The body must be a JSON object. Numbers are taken as-is, strings are
    /// parsed as decimals (the sensor firmware sends both), anything else is
    /// recorded as missing.
    pub fn decode(body: &str) -> Result<Self, FetchError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(FetchError::Decode(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let mut payload = RawPayload::new();
        for (name, value) in object {
            let number = match &value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            if number.is_none() {
                tracing::debug!("sensor field {} is not numeric: {}", name, value);
            }
            payload.insert(&name, number);
        }
        Ok(payload)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_numbers_and_strings() {
        let payload = RawPayload::decode(
            r#"{"airtemperature": 22.5, "airhumidity": "61.2", "waterlevel": " 30 "}"#,
        )
        .unwrap();

        assert_eq!(payload.get("airtemperature"), Some(22.5));
        assert_eq!(payload.get("airhumidity"), Some(61.2));
        assert_eq!(payload.get("waterlevel"), Some(30.0));
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn test_unparseable_fields_are_missing_not_zero() {
        let payload = RawPayload::decode(
            r#"{"soilhumidity": "n/a", "watertemperature": null, "airhumidity": true}"#,
        )
        .unwrap();

        assert!(payload.contains("soilhumidity"));
        assert_eq!(payload.get("soilhumidity"), None);
        assert_eq!(payload.get("watertemperature"), None);
        assert_eq!(payload.get("airhumidity"), None);
        assert_eq!(payload.get("airtemperature"), None);
    }

    #[test]
    fn test_non_finite_strings_are_missing() {
        let payload = RawPayload::decode(r#"{"waterlevel": "NaN", "airtemperature": "inf"}"#).unwrap();
        assert_eq!(payload.get("waterlevel"), None);
        assert_eq!(payload.get("airtemperature"), None);
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(matches!(RawPayload::decode("[1, 2]"), Err(FetchError::Decode(_))));
        assert!(matches!(RawPayload::decode("<html>"), Err(FetchError::Decode(_))));
        assert!(matches!(RawPayload::decode(""), Err(FetchError::Decode(_))));
    }
}
