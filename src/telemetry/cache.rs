//! Read-through telemetry cache
//!
//! Every read registers as a waiter on the next refresh cycle. The first
//! waiter of an idle cache starts the cycle, later ones ride along, so any
//! number of concurrent reads cost exactly one fetch. When the fetch
//! completes, every waiter of the cycle is answered from the same payload
//! snapshot under one lock.
//!
//! Fetch failures never reach readers: the previous payload is kept, the
//! error is recorded and readers get the best known value.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Instant, SystemTime};
use tokio::sync::oneshot;
use crate::fetcher::{FetchError, Fetcher, RawPayload};
use crate::telemetry::config::TelemetryConfig;
use crate::telemetry::errors::ConfigurationError;
use crate::telemetry::metric::{Fallback, Metric, MetricTable, Reading};

/// Handle to one telemetry cache
///
/// Cloning is cheap; all clones share the same state. Reads spawn the
/// refresh on the current tokio runtime.
#[derive(Clone)]
pub struct TelemetryCache {
    inner: Arc<Inner>,
}

/// Point-in-time view of the cache for observability
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub refresh_in_flight: bool,
    pub pending_waiters: usize,
    pub has_payload: bool,
    pub last_error: Option<FetchError>,
    pub last_success_at: Option<SystemTime>,
    pub refresh_count: u64,
    pub failure_count: u64,
}

struct Inner {
    config: TelemetryConfig,
    specs: MetricTable,
    fetcher: Arc<dyn Fetcher>,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    last_payload: Option<Arc<RawPayload>>,
    last_fetch_error: Option<FetchError>,
    refresh_in_flight: bool,
    waiters: Vec<Waiter>,

    last_success: Option<(Instant, SystemTime)>,
    // last value each metric derived from a fetched payload, backs
    // Fallback::LastKnown
    last_known: HashMap<Metric, f64>,
    refresh_count: u64,
    failure_count: u64,
}

struct Waiter {
    metric: Metric,
    reply: oneshot::Sender<Reading>,
}

impl TelemetryCache {
    pub fn new(config: TelemetryConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let specs = MetricTable::new(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                specs,
                fetcher,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.inner.config
    }

    /// Read one metric
    ///
    /// Resolves once the refresh cycle this call joined has completed,
    /// whatever its outcome. Dropping the returned future does not cancel
    /// the refresh for other readers.
    pub async fn read(&self, metric: Metric) -> Reading {
        tracing::debug!("read {}", metric);

        let (reply, answer) = oneshot::channel();
        let start_refresh = {
            let mut state = self.inner.lock_state();

            if let Some(reading) = self.inner.fresh_reading(&state, metric) {
                tracing::debug!("{} served from fresh payload: {}", metric, reading);
                return reading;
            }

            state.waiters.push(Waiter { metric, reply });
            if state.refresh_in_flight {
                false
            } else {
                state.refresh_in_flight = true;
                true
            }
        };

        if start_refresh {
            self.spawn_refresh();
        }

        match answer.await {
            Ok(reading) => reading,
            // the cycle always answers before dropping a waiter; if it did
            // not, the current state is the best we have
            Err(_) => {
                let state = self.inner.lock_state();
                self.inner.resolve(&state, metric)
            }
        }
    }

    /// Read a metric by name
    ///
    /// Unknown names fail immediately without touching the cache.
    pub async fn read_named(&self, name: &str) -> Result<Reading, ConfigurationError> {
        let metric: Metric = name.parse()?;
        Ok(self.read(metric).await)
    }

    /// Read every metric; the five reads share one refresh cycle
    pub async fn read_all(&self) -> Vec<(Metric, Reading)> {
        let (air_temperature, air_humidity, soil_humidity, water_level, water_temperature) = tokio::join!(
            self.read(Metric::AirTemperature),
            self.read(Metric::AirHumidity),
            self.read(Metric::SoilHumidity),
            self.read(Metric::WaterLevel),
            self.read(Metric::WaterTemperature),
        );

        vec![
            (Metric::AirTemperature, air_temperature),
            (Metric::AirHumidity, air_humidity),
            (Metric::SoilHumidity, soil_humidity),
            (Metric::WaterLevel, water_level),
            (Metric::WaterTemperature, water_temperature),
        ]
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.inner.lock_state();
        CacheStatus {
            refresh_in_flight: state.refresh_in_flight,
            pending_waiters: state.waiters.len(),
            has_payload: state.last_payload.is_some(),
            last_error: state.last_fetch_error.clone(),
            last_success_at: state.last_success.map(|(_, at)| at),
            refresh_count: state.refresh_count,
            failure_count: state.failure_count,
        }
    }

    fn spawn_refresh(&self) {
        let guard = RefreshGuard {
            inner: self.inner.clone(),
            finished: false,
        };

        tokio::spawn(async move {
            let mut guard = guard;
            let outcome = guard.inner.fetch_with_retries().await;
            guard.finish(outcome);
        });
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer without a fetch when the payload is younger than `max_age`
    fn fresh_reading(&self, state: &CacheState, metric: Metric) -> Option<Reading> {
        if self.config.max_age.is_zero() || state.refresh_in_flight {
            return None;
        }
        let (fetched_at, _) = state.last_success?;
        if fetched_at.elapsed() >= self.config.max_age {
            return None;
        }
        Some(self.resolve(state, metric))
    }

    async fn fetch_with_retries(&self) -> Result<RawPayload, FetchError> {
        let attempts = self.config.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(
                self.config.timeout,
                self.fetcher.fetch(&self.config.source_address, self.config.timeout),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };

            match result {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "fetch attempt {}/{} from {} failed: {}, retrying",
                        attempt,
                        attempts,
                        self.config.source_address,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the current cycle and answer all of its waiters
    fn complete(&self, outcome: Result<RawPayload, FetchError>) {
        let mut state = self.lock_state();
        state.refresh_count += 1;

        match outcome {
            Ok(payload) => {
                tracing::info!(
                    "sensor payload refreshed from {} ({} fields)",
                    self.config.source_address,
                    payload.len()
                );
                if payload.is_empty() {
                    tracing::warn!("sensor at {} sent an empty payload", self.config.source_address);
                }
                for spec in self.specs.iter() {
                    if let Some(value) = spec.derive(&payload) {
                        state.last_known.insert(spec.metric, value);
                    }
                }
                state.last_payload = Some(Arc::new(payload));
                state.last_fetch_error = None;
                state.last_success = Some((Instant::now(), SystemTime::now()));
            }
            Err(e) => {
                tracing::warn!(
                    "sensor refresh from {} failed, serving last known values: {}",
                    self.config.source_address,
                    e
                );
                state.last_fetch_error = Some(e);
                state.failure_count += 1;
            }
        }
        state.refresh_in_flight = false;

        let waiters = std::mem::take(&mut state.waiters);
        tracing::debug!("answering {} waiters", waiters.len());
        for waiter in waiters {
            let reading = self.resolve(&state, waiter.metric);
            // the reader may have gone away
            let _ = waiter.reply.send(reading);
        }
    }

    /// Value of `metric` from the current payload, or its fallback
    fn resolve(&self, state: &CacheState, metric: Metric) -> Reading {
        let spec = self.specs.spec(metric);

        let derived = state
            .last_payload
            .as_deref()
            .and_then(|payload| spec.derive(payload));
        if let Some(value) = derived {
            return Reading::Value(value);
        }

        match spec.fallback {
            Fallback::Fixed(value) => Reading::Value(value),
            Fallback::LastKnown => state
                .last_known
                .get(&metric)
                .copied()
                .map(Reading::Value)
                .unwrap_or(Reading::NoDataAvailable),
            Fallback::None => Reading::NoDataAvailable,
        }
    }
}

/// Ends the refresh cycle even when the refresh task never finishes
///
/// Dropped unfinished on runtime shutdown or a panicking fetcher; the
/// cycle is then closed as [`FetchError::Aborted`].
struct RefreshGuard {
    inner: Arc<Inner>,
    finished: bool,
}

impl RefreshGuard {
    fn finish(&mut self, outcome: Result<RawPayload, FetchError>) {
        self.finished = true;
        self.inner.complete(outcome);
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.inner.complete(Err(FetchError::Aborted));
        }
    }
}
