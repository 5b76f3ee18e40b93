use std::fmt;
use std::fmt::Display;

/// Setup mistakes that must fail loudly
///
/// Unlike fetch failures these are never absorbed or retried: they point
/// at a wrong configuration or a caller asking for something that does not
/// exist.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A read was requested for a metric name that is not exposed
    UnknownMetric(String),

    /// The sensor source address cannot be used for HTTP requests
    InvalidSourceAddress(String),

    /// A numeric calibration or timing parameter is out of range
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

impl std::error::Error for ConfigurationError {}

impl Display for ConfigurationError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigurationError::UnknownMetric(name) => write!(fmt, "unknown metric: {}", name),
            ConfigurationError::InvalidSourceAddress(reason) => {
                write!(fmt, "invalid source address: {}", reason)
            }
            ConfigurationError::InvalidParameter { name, reason } => {
                write!(fmt, "invalid parameter {}: {}", name, reason)
            }
        }
    }
}
