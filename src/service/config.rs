use std::fs;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::accessory::AccessoryInfo;
use crate::telemetry::{ConfigurationError, Fallback, Metric, TelemetryConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accessory: AccessoryInfo,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// sensor endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    // sensor address, eg: 192.168.1.7 or http://192.168.1.7/
    #[serde(default = "default_url")]
    pub url: String,

    // hard limit for one fetch attempt
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    // extra attempts within one refresh cycle
    #[serde(default)]
    pub retries: u32,

    // reads within this window after a successful fetch do not refetch
    #[serde(default)]
    pub max_age_ms: u64,
}

fn default_url() -> String {
    "localhost".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_ms: default_timeout_ms(),
            retries: 0,
            max_age_ms: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalibrationConfig {
    // subtracted from the raw air temperature
    #[serde(default)]
    pub temperature_correction: f64,

    // distance between the ultrasound sensor and the pond bottom
    #[serde(default)]
    pub ultrasound_distance: f64,
}

/// Per-metric fallback, either a number or `"last_known"` / `"none"`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FallbackSetting {
    Fixed(f64),
    Policy(FallbackPolicy),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    None,
    LastKnown,
}

impl From<FallbackSetting> for Fallback {
    fn from(setting: FallbackSetting) -> Self {
        match setting {
            FallbackSetting::Fixed(value) => Fallback::Fixed(value),
            FallbackSetting::Policy(FallbackPolicy::None) => Fallback::None,
            FallbackSetting::Policy(FallbackPolicy::LastKnown) => Fallback::LastKnown,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub air_temperature: Option<FallbackSetting>,
    pub air_humidity: Option<FallbackSetting>,
    pub soil_humidity: Option<FallbackSetting>,
    pub water_level: Option<FallbackSetting>,
    pub water_temperature: Option<FallbackSetting>,
}

impl FallbackConfig {
    pub fn get(&self, metric: Metric) -> Option<FallbackSetting> {
        match metric {
            Metric::AirTemperature => self.air_temperature,
            Metric::AirHumidity => self.air_humidity,
            Metric::SoilHumidity => self.soil_humidity,
            Metric::WaterLevel => self.water_level,
            Metric::WaterTemperature => self.water_temperature,
        }
    }
}

/// exposition server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8581
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Build the cache configuration, validating the source address
    pub fn telemetry_config(&self) -> Result<TelemetryConfig, ConfigurationError> {
        let mut config = TelemetryConfig::new(
            &self.source.url,
            self.calibration.temperature_correction,
            self.calibration.ultrasound_distance,
            Duration::from_millis(self.source.timeout_ms),
        )?
        .with_retries(self.source.retries)
        .with_max_age(Duration::from_millis(self.source.max_age_ms));

        for metric in Metric::ALL {
            if let Some(setting) = self.fallback.get(metric) {
                config = config.with_fallback(metric, setting.into())?;
            }
        }
        Ok(config)
    }
}

pub fn parse(content: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

pub fn load(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}
