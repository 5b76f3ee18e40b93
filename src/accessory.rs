//! Accessory description published to home-automation bridges
//!
//! Maps each metric to the bridge service that carries it and the
//! characteristic the value is read through. Registration itself is up to
//! the bridge.

use serde::{Deserialize, Serialize};
use crate::telemetry::Metric;

pub const DEFAULT_NAME: &str = "Pondsensors";
pub const DEFAULT_MANUFACTURER: &str = "Daniel Blank";
pub const DEFAULT_MODEL: &str = "Pondsensor";

/// Accessory information block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryInfo {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_manufacturer() -> String {
    DEFAULT_MANUFACTURER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl AccessoryInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            manufacturer: default_manufacturer(),
            model: default_model(),
        }
    }
}

impl Default for AccessoryInfo {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

/// Bridge service kinds used by this accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    TemperatureSensor,
    HumiditySensor,
    HumidifierDehumidifier,
}

/// Characteristics read by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Characteristic {
    CurrentTemperature,
    CurrentRelativeHumidity,
    WaterLevel,
}

/// One exposed service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDescriptor {
    pub metric: &'static str,
    pub service: ServiceKind,
    pub characteristic: Characteristic,
    pub unit: &'static str,
}

impl ServiceDescriptor {
    pub fn for_metric(metric: Metric) -> Self {
        let (service, characteristic) = match metric {
            Metric::AirTemperature | Metric::WaterTemperature => {
                (ServiceKind::TemperatureSensor, Characteristic::CurrentTemperature)
            }
            Metric::AirHumidity | Metric::SoilHumidity => {
                (ServiceKind::HumiditySensor, Characteristic::CurrentRelativeHumidity)
            }
            Metric::WaterLevel => (ServiceKind::HumidifierDehumidifier, Characteristic::WaterLevel),
        };

        Self {
            metric: metric.name(),
            service,
            characteristic,
            unit: metric.unit(),
        }
    }
}

/// Every service of the accessory, in registration order
pub fn services() -> Vec<ServiceDescriptor> {
    Metric::ALL.into_iter().map(ServiceDescriptor::for_metric).collect()
}
