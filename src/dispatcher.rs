use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use isahc::{
    config::{Configurable, RedirectPolicy},
    http::{header::CONTENT_TYPE, Request},
    AsyncBody,
    AsyncReadResponseExt,
    HttpClient,
};
use tokio::{
    runtime::{Builder, Runtime},
    sync::mpsc,
    task::JoinSet,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::config::BenchmarkConfig;
use crate::error::{Error, RequestError, Result};
use crate::outcome::RequestOutcome;
use crate::progress::Progress;

const MAX_REDIRECTS: u32 = 10;

/// Pre-filled pool of interchangeable job tokens, each handed out once.
#[derive(Debug)]
struct JobQueue {
    remaining: AtomicUsize,
}

impl JobQueue {
    fn new(tokens: usize) -> Self {
        Self { remaining: AtomicUsize::new(tokens) }
    }

    /// Takes one token, `false` once the queue is drained.
    fn take(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Raw output of a drained worker pool.
#[derive(Debug)]
pub struct Dispatched {
    pub outcomes: Vec<RequestOutcome>,
    pub elapsed: Duration, // from pool start until the last worker exits
}

/// Runs `requests` attempts over `concurrency` workers sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<BenchmarkConfig>,
    client: HttpClient,
}

impl Dispatcher {
    /*------------------==| Public Functions |==-------------------------*/
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        let mut builder = HttpClient::builder().redirect_policy(RedirectPolicy::Limit(MAX_REDIRECTS));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(Error::Client)?;

        Ok(Self { config: Arc::new(config), client })
    }

    /// Drain the job queue and return once every worker has exited.
    pub async fn dispatch(&self, progress: Arc<dyn Progress>) -> Result<Dispatched> {
        let requests = self.config.requests;
        let jobs = Arc::new(JobQueue::new(requests));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let workers_count = worker_count(&self.config);

        info!(
            url = %self.config.url,
            method = %self.config.method,
            requests,
            concurrency = self.config.concurrency,
            workers = workers_count,
            "dispatching"
        );

        let start = Instant::now();
        let mut workers = JoinSet::new();
        for id in 0..workers_count {
            let dispatcher = self.clone();
            let jobs = Arc::clone(&jobs);
            let tx = tx.clone();
            let progress = Arc::clone(&progress);
            workers.spawn(async move { dispatcher.work(id, &jobs, tx, progress.as_ref()).await });
        }
        drop(tx);

        // The sink is unbounded, so workers never wait on the receiver.
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "worker died");
                return Err(err.into());
            }
        }
        let elapsed = start.elapsed();

        let mut outcomes = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        info!(outcomes = outcomes.len(), elapsed = ?elapsed, "pool drained");
        Ok(Dispatched { outcomes, elapsed })
    }

    /*-------------------==| Private/Helpers |==----------------------- */

    async fn work(
        &self,
        id: usize,
        jobs: &JobQueue,
        results: mpsc::UnboundedSender<RequestOutcome>,
        progress: &dyn Progress
    ) {
        let mut handled = 0usize;
        while jobs.take() {
            let outcome = self.attempt().await;
            progress.on_outcome(&outcome);
            handled += 1;
            if results.send(outcome).is_err() {
                break;
            }
        }
        debug!(worker = id, handled, "worker done");
    }

    /// One full request attempt. Never fails, errors become the outcome.
    async fn attempt(&self) -> RequestOutcome {
        let start = Instant::now();

        let request = match build_request(&self.config) {
            Ok(request) => request,
            Err(err) => return failed(start, None, err.into()),
        };

        let mut response = match self.client.send_async(request).await {
            Ok(response) => response,
            Err(err) => return failed(start, None, err.into()),
        };

        // Drain whatever came back so the connection can be reused.
        let status = response.status();
        let drained = response.consume().await;

        if status.as_u16() >= 400 {
            return failed(start, Some(status.as_u16()), RequestError::Status(status));
        }
        if let Err(err) = drained {
            return failed(start, Some(status.as_u16()), err.into());
        }
        RequestOutcome::success(start.elapsed(), status.as_u16())
    }
}

fn failed(start: Instant, status: Option<u16>, err: RequestError) -> RequestOutcome {
    let outcome = RequestOutcome::failure(start.elapsed(), status, &err);
    debug!(error = %err, ?status, "request failed");
    outcome
}

fn build_request(config: &BenchmarkConfig) -> std::result::Result<Request<AsyncBody>, isahc::http::Error> {
    let mut builder = Request::builder()
        .method(config.method.as_str())
        .uri(config.url.as_str());
    if let Some(content_type) = &config.content_type {
        builder = builder.header(CONTENT_TYPE, content_type.as_str());
    }

    let body = match &config.body {
        Some(body) => AsyncBody::from(body.clone()),
        None => AsyncBody::empty(),
    };
    builder.body(body)
}

// Workers beyond the number of tokens would exit without taking one.
fn worker_count(config: &BenchmarkConfig) -> usize {
    config.concurrency.min(config.requests)
}

/// Multi-threaded runtime the workers are scheduled on.
pub fn runtime(threads: usize) -> Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(threads.max(1))
        .enable_all()
        .build()
        .map_err(Error::Runtime)
}
