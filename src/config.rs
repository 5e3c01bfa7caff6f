use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_BODY_CONTENT_TYPE: &str = "application/json";

/// Everything a run needs. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    pub url: Url,
    pub method: String, // validated per attempt, an invalid method fails each request
    pub body: Option<String>,
    pub content_type: Option<String>,

    pub requests: usize, // total request attempts
    pub concurrency: usize, // number of workers
    pub threads: usize, // async runtime worker threads

    pub timeout: Option<Duration>, // whole request/response cycle, transport default when None
    pub connect_timeout: Option<Duration>, // connection establishment only
}

impl BenchmarkConfig {
    pub fn new(url: Url, requests: usize, concurrency: usize) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            body: None,
            content_type: None,
            requests,
            concurrency,
            threads: default_threads(),
            timeout: None,
            connect_timeout: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Reject configurations that would make a degenerate run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests == 0 {
            return Err(ConfigError::ZeroRequests);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Command line surface of the `reqbench` binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "reqbench", version, about = "A tiny HTTP benchmarking tool")]
#[command(after_help = "Examples:
  reqbench -u https://example.com -n 100 -c 5
  reqbench -u https://api.example.com/users -m POST -n 50 -c 10
  reqbench -u https://api.example.com/users -m POST -d '{\"name\":\"John\"}' -H application/json -n 50 -c 10

Durations can be specified like: 10s, 1m, 1h")]
pub struct Args {
    /// URL to benchmark
    #[arg(short = 'u', long)]
    pub url: String,

    /// HTTP method to use (GET, POST, PUT, DELETE, etc.)
    #[arg(short = 'm', long, default_value = "GET")]
    pub method: String,

    /// Request body data (for POST/PUT requests)
    #[arg(short = 'd', long = "data")]
    pub data: Option<String>,

    /// Content-Type header (default: application/json for POST/PUT with data)
    #[arg(short = 'H', long = "header")]
    pub header: Option<String>,

    /// Total number of requests
    #[arg(short = 'n', long, default_value_t = 1)]
    pub requests: usize,

    /// Number of concurrent workers
    #[arg(short = 'c', long, default_value_t = 1)]
    pub concurrency: usize,

    /// Number of runtime threads (default: available CPUs)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Request timeout, no timeout unless given
    #[arg(short = 'T', long)]
    pub timeout: Option<String>,

    /// Connection timeout, no timeout unless given
    #[arg(short = 'C', long = "connection-timeout")]
    pub connection_timeout: Option<String>,

    /// Summarize output
    #[arg(short = 's', long)]
    pub summarize: bool,

    /// Do not draw a progress bar
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl TryFrom<&Args> for BenchmarkConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let url = Url::parse(&args.url).map_err(|e| ConfigError::InvalidUrl {
            url: args.url.clone(),
            reason: e.to_string(),
        })?;

        let method = args.method.trim().to_ascii_uppercase();
        let method = if method.is_empty() { "GET".to_string() } else { method };

        let body = args.data.clone().filter(|b| !b.is_empty());
        let content_type = args
            .header
            .clone()
            .filter(|h| !h.is_empty())
            .or_else(|| default_content_type(&method, body.as_deref()).map(str::to_string));

        let mut config = BenchmarkConfig::new(url, args.requests, args.concurrency)
            .with_method(method);
        config.body = body;
        config.content_type = content_type;
        if let Some(threads) = args.threads {
            config.threads = threads;
        }
        if let Some(timeout) = &args.timeout {
            config.timeout = Some(parse_duration_string(timeout, "timeout")?);
        }
        if let Some(timeout) = &args.connection_timeout {
            config.connect_timeout = Some(parse_duration_string(timeout, "connection-timeout")?);
        }

        config.validate()?;
        Ok(config)
    }
}

/// POST and PUT with a body default to JSON when no content type was given.
pub fn default_content_type(method: &str, body: Option<&str>) -> Option<&'static str> {
    match body {
        Some(_) if method == "POST" || method == "PUT" => Some(DEFAULT_BODY_CONTENT_TYPE),
        _ => None,
    }
}

// Parses "10s", "1m", "1h"; a bare number is seconds
pub fn parse_duration_string(duration_str: &str, what: &'static str) -> Result<Duration, ConfigError> {
    let duration_str = duration_str.trim();
    let invalid = || ConfigError::InvalidDuration(duration_str.to_string());

    if duration_str.is_empty() {
        return Err(invalid());
    }

    let (value_str, multiplier) = match duration_str.as_bytes()[duration_str.len() - 1] {
        b's' => (&duration_str[..duration_str.len() - 1], 1),
        b'm' => (&duration_str[..duration_str.len() - 1], 60),
        b'h' => (&duration_str[..duration_str.len() - 1], 60 * 60),
        _ => (duration_str, 1),
    };
    let value: u64 = value_str.parse().map_err(|_| invalid())?;

    let duration = Duration::from_secs(value.checked_mul(multiplier).ok_or_else(invalid)?);
    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration { what, value: duration });
    }
    Ok(duration)
}
