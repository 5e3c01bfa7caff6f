use std::collections::BTreeMap;
use std::time::Duration;

use crate::outcome::RequestOutcome;

const BUCKET_COUNT: usize = 10; // size of the latency histogram

/// Aggregate statistics of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub total_requests: usize,
    pub success_count: usize,
    pub failure_count: usize,

    pub status_codes: BTreeMap<u16, usize>, // failed responses by status code
    pub errors: BTreeMap<String, usize>, // failures by error message

    pub min_latency: Duration,
    pub max_latency: Duration,
    pub avg_latency: Duration,
    pub total_latency: Duration, // sum of every attempt's duration

    pub total_duration: Duration, // wall time of the whole run
    pub requests_per_sec: f64,

    pub latencies: Vec<Duration>, // sorted ascending
}

/// Latency percentiles, nearest-rank on the sorted latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyDistribution {
    pub p50: Duration,
    pub p75: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

/// One bar of the latency histogram, `[lower, upper)` except the last bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub lower: Duration,
    pub upper: Duration,
    pub count: usize,
}

impl Summary {
    /// Reduce the complete set of outcomes. The result does not depend on the
    /// order outcomes arrive in.
    pub fn from_outcomes<I>(outcomes: I, total_duration: Duration) -> Self
        where I: IntoIterator<Item = RequestOutcome>
    {
        let mut summary = Summary { total_duration, ..Default::default() };
        let mut min: Option<Duration> = None;

        for outcome in outcomes {
            summary.total_requests += 1;

            if outcome.success {
                summary.success_count += 1;
            } else {
                summary.failure_count += 1;
                if let Some(status) = outcome.status {
                    *summary.status_codes.entry(status).or_default() += 1;
                }
                if let Some(error) = outcome.error.filter(|e| !e.is_empty()) {
                    *summary.errors.entry(error).or_default() += 1;
                }
            }

            min = Some(min.map_or(outcome.duration, |m| m.min(outcome.duration)));
            summary.max_latency = summary.max_latency.max(outcome.duration);
            summary.total_latency += outcome.duration;
            summary.latencies.push(outcome.duration);
        }

        summary.min_latency = min.unwrap_or(Duration::ZERO);
        if summary.total_requests > 0 {
            let avg_nanos = summary.total_latency.as_nanos() / (summary.total_requests as u128);
            summary.avg_latency = Duration::from_nanos(avg_nanos as u64);
        }
        let secs = total_duration.as_secs_f64();
        if secs > 0.0 {
            summary.requests_per_sec = summary.total_requests as f64 / secs;
        }
        summary.latencies.sort_unstable();

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    /// `None` when nothing was measured.
    pub fn percentile(&self, p: f64) -> Option<Duration> {
        if self.latencies.is_empty() {
            return None;
        }
        let idx = ((p / 100.0) * (self.latencies.len() as f64)) as usize;
        Some(self.latencies[idx.min(self.latencies.len() - 1)])
    }

    pub fn distribution(&self) -> Option<LatencyDistribution> {
        Some(LatencyDistribution {
            p50: self.percentile(50.0)?,
            p75: self.percentile(75.0)?,
            p90: self.percentile(90.0)?,
            p99: self.percentile(99.0)?,
        })
    }

    /// Equal-width buckets from zero up to the slowest request.
    pub fn histogram(&self) -> Vec<Bucket> {
        let max = match self.latencies.last() {
            Some(max) if !max.is_zero() => *max,
            Some(_) => {
                return vec![Bucket {
                    lower: Duration::ZERO,
                    upper: Duration::ZERO,
                    count: self.latencies.len(),
                }];
            }
            None => return Vec::new(),
        };
        let bucket_size = max.as_secs_f64() / (BUCKET_COUNT as f64);

        let mut counts = [0usize; BUCKET_COUNT];
        for latency in &self.latencies {
            let bucket = (latency.as_secs_f64() / bucket_size).min((BUCKET_COUNT - 1) as f64) as usize;
            counts[bucket] += 1;
        }

        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| Bucket {
                lower: Duration::from_secs_f64((i as f64) * bucket_size),
                upper: Duration::from_secs_f64(((i as f64) + 1.0) * bucket_size),
                count,
            })
            .collect()
    }
}
