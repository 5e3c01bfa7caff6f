//! HTTP load generation: send a fixed number of requests through a bounded
//! worker pool and reduce the per-request outcomes into one [`Summary`].
//!
//! ```no_run
//! use reqbench::{run, BenchmarkConfig};
//! use url::Url;
//!
//! let config = BenchmarkConfig::new(Url::parse("http://localhost:8080/").unwrap(), 100, 10);
//! let summary = run(&config, ()).unwrap();
//! println!("{} ok, {} failed", summary.success_count, summary.failure_count);
//! ```

pub mod aggregator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod progress;
pub mod report;

use std::sync::Arc;

use tracing::info;

pub use aggregator::Summary;
pub use config::BenchmarkConfig;
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, Error, RequestError, Result};
pub use outcome::RequestOutcome;
pub use progress::Progress;
pub use report::Report;

/// Run one benchmark to completion on a fresh runtime and summarize it.
///
/// Per-request failures are part of the summary; only configuration and
/// runtime faults are returned as errors.
pub fn run<P: Progress + 'static>(config: &BenchmarkConfig, progress: P) -> Result<Summary> {
    config.validate()?;
    let runtime = dispatcher::runtime(config.threads)?;
    runtime.block_on(run_async(config, progress))
}

/// Same as [`run`], on the caller's runtime.
pub async fn run_async<P: Progress + 'static>(config: &BenchmarkConfig, progress: P) -> Result<Summary> {
    config.validate()?;
    let dispatcher = Dispatcher::new(config.clone())?;

    let progress: Arc<dyn Progress> = Arc::new(progress);
    let dispatched = dispatcher.dispatch(Arc::clone(&progress)).await?;
    progress.finish();

    let summary = Summary::from_outcomes(dispatched.outcomes, dispatched.elapsed);
    info!(
        success = summary.success_count,
        failed = summary.failure_count,
        rps = summary.requests_per_sec,
        "run finished"
    );
    Ok(summary)
}
