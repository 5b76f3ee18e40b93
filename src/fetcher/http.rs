use std::io;
use std::time::Duration;
use async_trait::async_trait;
use crate::fetcher::{FetchError, Fetcher, RawPayload};

/// Fetches the sensor payload with a plain HTTP GET
///
/// The request runs on tokio's blocking pool. The timeout is applied twice:
/// once by ureq to the socket and once around the blocking task, so a stuck
/// resolver cannot hold a refresh cycle past `timeout`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {}
    }

    fn fetch_blocking(url: &str, timeout: Duration) -> Result<RawPayload, FetchError> {
        let response = ureq::get(url)
            .set("Accept", "application/json")
            .timeout(timeout)
            .call()
            .map_err(from_ureq)?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FetchError::Status(status));
        }

        let body = response.into_string().map_err(from_io)?;
        RawPayload::decode(&body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, address: &str, timeout: Duration) -> Result<RawPayload, FetchError> {
        let url = address.to_string();
        tracing::debug!("fetching sensor payload from {}", url);

        let task = tokio::task::spawn_blocking(move || Self::fetch_blocking(&url, timeout));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FetchError::Connection(format!("fetch task failed: {}", e))),
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

fn from_ureq(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Status(code),
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                FetchError::Timeout
            } else {
                FetchError::Connection(transport.to_string())
            }
        }
    }
}

fn from_io(err: io::Error) -> FetchError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FetchError::Timeout,
        // body is not UTF-8 or exceeds ureq's size limit
        io::ErrorKind::InvalidData => FetchError::Decode(err.to_string()),
        _ => FetchError::Connection(err.to_string()),
    }
}

fn is_timeout(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(io_err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
                return true;
            }
        }
        source = e.source();
    }
    false
}
