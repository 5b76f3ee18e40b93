pub mod accessory;
pub mod fetcher;
pub mod http;
pub mod service;
pub mod telemetry;
mod utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
