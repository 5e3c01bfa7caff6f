use std::time::Duration;

use isahc::http::StatusCode;
use thiserror::Error;

/// Rejected configuration, reported before any request is sent.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of requests must be greater than zero")]
    ZeroRequests,

    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("number of threads must be greater than zero")]
    ZeroThreads,

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid duration \"{0}\" (use e.g. 10s, 1m, 1h)")]
    InvalidDuration(String),

    #[error("{what} must be greater than zero, got {value:?}")]
    ZeroDuration { what: &'static str, value: Duration },
}

/// Why a single request attempt failed.
///
/// The rendered message is what the error histogram is keyed on, so it must
/// stay free of per-attempt noise (timings, ids).
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("failed to create request: {0}")]
    Build(#[from] isahc::http::Error),

    #[error("request failed: {0}")]
    Transport(#[from] isahc::Error),

    #[error("HTTP {}", format_status(.0))]
    Status(StatusCode),

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),
}

fn format_status(status: &StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Faults that abort a whole run. Per-request failures never end up here.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] isahc::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("worker task terminated abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
