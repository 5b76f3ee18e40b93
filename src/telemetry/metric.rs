//! Exposed metrics and their fixed transformation policy
//!
//! Each metric reads one field of the sensor payload, converts it with a
//! pure [`Transform`] and falls back to a per-metric [`Fallback`] when the
//! field cannot be derived.

use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use crate::fetcher::RawPayload;
use crate::telemetry::config::TelemetryConfig;
use crate::telemetry::errors::ConfigurationError;

/// Water level is reported as a percentage
pub const WATER_LEVEL_MIN: f64 = 0.0;
pub const WATER_LEVEL_MAX: f64 = 100.0;

/// The closed set of readable telemetry quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    AirTemperature,
    AirHumidity,
    SoilHumidity,
    WaterLevel,
    WaterTemperature,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::AirTemperature,
        Metric::AirHumidity,
        Metric::SoilHumidity,
        Metric::WaterLevel,
        Metric::WaterTemperature,
    ];

    /// Public name used by readers
    pub fn name(&self) -> &'static str {
        match self {
            Metric::AirTemperature => "airTemperature",
            Metric::AirHumidity => "airHumidity",
            Metric::SoilHumidity => "soilHumidity",
            Metric::WaterLevel => "waterLevel",
            Metric::WaterTemperature => "waterTemperature",
        }
    }

    /// Payload field the sensor firmware reports this metric under
    pub fn source_field(&self) -> &'static str {
        match self {
            Metric::AirTemperature => "airtemperature",
            Metric::AirHumidity => "airhumidity",
            Metric::SoilHumidity => "soilhumidity",
            Metric::WaterLevel => "waterlevel",
            Metric::WaterTemperature => "watertemperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::AirTemperature | Metric::WaterTemperature => "celsius",
            Metric::AirHumidity | Metric::SoilHumidity | Metric::WaterLevel => "percent",
        }
    }

    fn index(&self) -> usize {
        match self {
            Metric::AirTemperature => 0,
            Metric::AirHumidity => 1,
            Metric::SoilHumidity => 2,
            Metric::WaterLevel => 3,
            Metric::WaterTemperature => 4,
        }
    }
}

impl Display for Metric {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.name().fmt(fmt)
    }
}

impl FromStr for Metric {
    type Err = ConfigurationError;

    /// Accepts `waterLevel`, `water_level`, `water-level` and `waterlevel`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Metric::ALL
            .into_iter()
            .find(|m| m.source_field() == normalized)
            .ok_or_else(|| ConfigurationError::UnknownMetric(s.to_string()))
    }
}

/// Pure conversion from a raw field to the exposed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// `value = raw`
    Identity,

    /// `value = raw - offset`
    Subtract(f64),

    /// `value = clamp(reference - raw, min, max)`
    ///
    /// Used for the ultrasound distance sensor: the further the water
    /// surface, the lower the level.
    ReferenceMinus { reference: f64, min: f64, max: f64 },
}

impl Transform {
    /// `raw` must be finite; payload decoding guarantees this
    pub fn apply(&self, raw: f64) -> f64 {
        match *self {
            Transform::Identity => raw,
            Transform::Subtract(offset) => raw - offset,
            Transform::ReferenceMinus { reference, min, max } => (reference - raw).clamp(min, max),
        }
    }
}

/// What a metric reports when its value cannot be derived
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fallback {
    /// Report "no data"
    None,

    /// Report a fixed value
    Fixed(f64),

    /// Report the last value this metric derived, "no data" if there is none
    #[default]
    LastKnown,
}

/// Result of one read
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f64),

    /// Nothing was ever fetched for this metric and no fallback applies
    NoDataAvailable,
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::NoDataAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl Display for Reading {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(fmt, "{}", v),
            Reading::NoDataAvailable => "no data available".fmt(fmt),
        }
    }
}

/// Static description of one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub metric: Metric,
    pub source_field: &'static str,
    pub transform: Transform,
    pub fallback: Fallback,
}

impl MetricSpec {
    /// Derived value from `payload`, `None` when the source field is missing
    pub fn derive(&self, payload: &RawPayload) -> Option<f64> {
        payload.get(self.source_field).map(|raw| self.transform.apply(raw))
    }
}

/// One spec per metric, built once from the configuration
#[derive(Debug, Clone)]
pub struct MetricTable {
    specs: Vec<MetricSpec>,
}

impl MetricTable {
    pub fn new(config: &TelemetryConfig) -> Self {
        let specs = Metric::ALL
            .into_iter()
            .map(|metric| {
                let transform = match metric {
                    Metric::AirTemperature => Transform::Subtract(config.correction_offset),
                    Metric::WaterLevel => Transform::ReferenceMinus {
                        reference: config.reference_distance,
                        min: WATER_LEVEL_MIN,
                        max: WATER_LEVEL_MAX,
                    },
                    Metric::AirHumidity | Metric::SoilHumidity | Metric::WaterTemperature => {
                        Transform::Identity
                    }
                };
                MetricSpec {
                    metric,
                    source_field: metric.source_field(),
                    transform,
                    fallback: config.fallback(metric),
                }
            })
            .collect();

        Self { specs }
    }

    pub fn spec(&self, metric: Metric) -> &MetricSpec {
        &self.specs[metric.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.specs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn table(correction: f64, reference: f64) -> MetricTable {
        let config =
            TelemetryConfig::new("http://sensor.local/", correction, reference, Duration::from_secs(1))
                .unwrap();
        MetricTable::new(&config)
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
            assert_eq!(metric.source_field().parse::<Metric>().unwrap(), metric);
        }
        assert_eq!("water_level".parse::<Metric>().unwrap(), Metric::WaterLevel);
        assert_eq!("Air-Temperature".parse::<Metric>().unwrap(), Metric::AirTemperature);
    }

    #[test]
    fn test_unknown_metric() {
        let err = "pressure".parse::<Metric>().unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownMetric("pressure".to_string()));
    }

    #[test]
    fn test_temperature_correction() {
        let table = table(1.5, 100.0);
        let payload = RawPayload::new().with_field("airtemperature", 22.5);
        assert_eq!(table.spec(Metric::AirTemperature).derive(&payload), Some(21.0));
    }

    #[test]
    fn test_water_level_derivation_and_clamp() {
        let table = table(0.0, 100.0);
        let spec = table.spec(Metric::WaterLevel);

        let payload = RawPayload::new().with_field("waterlevel", 30.0);
        assert_eq!(spec.derive(&payload), Some(70.0));

        let payload = RawPayload::new().with_field("waterlevel", 150.0);
        assert_eq!(spec.derive(&payload), Some(0.0));

        let payload = RawPayload::new().with_field("waterlevel", -20.0);
        assert_eq!(spec.derive(&payload), Some(100.0));
    }

    #[test]
    fn test_passthrough_metrics() {
        let table = table(1.5, 100.0);
        let payload = RawPayload::new()
            .with_field("airhumidity", 55.0)
            .with_field("soilhumidity", 40.0)
            .with_field("watertemperature", 18.25);

        assert_eq!(table.spec(Metric::AirHumidity).derive(&payload), Some(55.0));
        assert_eq!(table.spec(Metric::SoilHumidity).derive(&payload), Some(40.0));
        assert_eq!(table.spec(Metric::WaterTemperature).derive(&payload), Some(18.25));
    }

    #[test]
    fn test_missing_field_is_not_derived() {
        let table = table(1.5, 100.0);
        let mut payload = RawPayload::new();
        payload.insert("waterlevel", None);

        assert_eq!(table.spec(Metric::WaterLevel).derive(&payload), None);
        assert_eq!(table.spec(Metric::SoilHumidity).derive(&payload), None);
    }
}
