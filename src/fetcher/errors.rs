//! Remote fetch errors
//!
//! Every failure mode of a single sensor retrieval. These errors never
//! escape the telemetry cache: they are recorded on the cache state and
//! readers keep receiving the best known value.

use std::fmt;
use std::fmt::Display;

/// Failure of one retrieval from the sensor endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The endpoint could not be reached
    ///
    /// Covers DNS resolution, refused connections and broken transports.
    Connection(String),

    /// The endpoint answered with a non-success HTTP status
    Status(u16),

    /// The body was not a JSON object of sensor fields
    Decode(String),

    /// No complete answer arrived within the configured timeout
    Timeout,

    /// The refresh task ended before the fetch completed
    ///
    /// Happens when the runtime shuts down or a fetcher panics mid-cycle.
    Aborted,
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl std::error::Error for FetchError {}

impl Display for FetchError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchError::Connection(e) => write!(fmt, "connection failed: {}", e),
            FetchError::Status(code) => write!(fmt, "sensor returned status {}", code),
            FetchError::Decode(e) => write!(fmt, "malformed sensor payload: {}", e),
            FetchError::Timeout => "sensor request timed out".fmt(fmt),
            FetchError::Aborted => "refresh aborted".fmt(fmt),
        }
    }
}
