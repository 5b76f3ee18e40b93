use clap::Parser;

pub mod config;
pub mod main;

/// Pond sensor telemetry service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "pondsensors.toml")]
    pub config: String,

    /// Sensor address, overrides [source] url
    #[arg(short, long)]
    pub url: Option<String>,

    /// HTTP exposition port, overrides [http] port
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Read one metric (or "all") once, print it and exit
    #[arg(short, long)]
    pub read: Option<String>,
}
