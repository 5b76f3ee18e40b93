use clap::Parser;
use std::sync::Arc;
use crate::fetcher::HttpFetcher;
use crate::http::{AppState, server};
use crate::service::Args;
use crate::service::config::{self, Config};
use crate::telemetry::{TelemetryCache, TelemetryConfig};
use crate::utils;

pub async fn run_service() {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    let mut cfg = match config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(url) = &args.url {
        cfg.source.url = url.clone();
    }
    if let Some(port) = args.http_port {
        cfg.http.port = port;
    }

    let telemetry_config = match cfg.telemetry_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if args.read.is_none() {
        log_startup_banner(&cfg, &telemetry_config);
    }
    let cache = TelemetryCache::new(telemetry_config, Arc::new(HttpFetcher::new()));

    if let Some(name) = &args.read {
        read_once(&cache, name).await;
        return;
    }

    let app_state = AppState::new(cache, cfg.accessory.clone());
    tokio::select! {
        result = server::start(&cfg.http.listen_addr, cfg.http.port, app_state) => {
            if let Err(e) = result {
                tracing::error!("HTTP server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
}

async fn read_once(cache: &TelemetryCache, name: &str) {
    if name.eq_ignore_ascii_case("all") {
        for (metric, reading) in cache.read_all().await {
            println!("{}: {}", metric, reading);
        }
        return;
    }

    match cache.read_named(name).await {
        Ok(reading) => println!("{}: {}", name, reading),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    }

    if let Some(e) = cache.status().last_error {
        tracing::warn!("value may be stale: {}", e);
    }
}

fn log_startup_banner(cfg: &Config, telemetry: &TelemetryConfig) {
    println!("====================================");
    println!("  Pondsensors Starting");
    println!("====================================");
    println!("Accessory: {} ({} {})", cfg.accessory.name, cfg.accessory.manufacturer, cfg.accessory.model);
    println!("Sensor address: {}", telemetry.source_address);
    println!("Fetch timeout: {}ms, retries: {}", telemetry.timeout.as_millis(), telemetry.retries);
    println!("Temperature correction: {}", telemetry.correction_offset);
    println!("Ultrasound distance: {}", telemetry.reference_distance);
    println!("------------------------------------");
}
