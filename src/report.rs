use std::io::{self, Write};
use std::time::Duration;

use crate::aggregator::Summary;
use crate::config::BenchmarkConfig;

const FIELD_WIDTH: usize = 18; // width of each label column

/// Text rendering of a finished run.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    config: &'a BenchmarkConfig,
    summary: &'a Summary,
}

impl<'a> Report<'a> {
    pub fn new(config: &'a BenchmarkConfig, summary: &'a Summary) -> Self {
        Self { config, summary }
    }

    /// Write the full or the summarized layout.
    pub fn write<W: Write>(&self, out: &mut W, summarize: bool) -> io::Result<()> {
        if summarize {
            self.write_summarized(out)
        } else {
            self.write_full(out)
        }
    }

    pub fn write_full<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "====== Benchmark Result ======")?;
        self.write_target(out)?;
        writeln!(out)?;

        self.write_counts(out)?;
        self.write_failure_details(out)?;
        writeln!(out)?;

        self.write_timings(out)?;
        writeln!(out)?;
        if self.write_distribution(out)? {
            writeln!(out)?;
        }
        self.write_histogram(out)
    }

    pub fn write_summarized<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = self.summary;
        writeln!(out)?;
        writeln!(
            out,
            "Sent {} requests to {} in {}",
            s.total_requests,
            self.config.url,
            format_latency(s.total_duration)
        )?;
        if s.has_failures() {
            writeln!(out, "Failed requests: {} of {}", s.failure_count, s.total_requests)?;
        }
        writeln!(out, " {:<10} {:<10} {:<10}", "Avg", "Min", "Max")?;
        writeln!(
            out,
            " {:<10} {:<10} {:<10}",
            format_latency(s.avg_latency),
            format_latency(s.min_latency),
            format_latency(s.max_latency)
        )?;
        writeln!(out, "{:<20} {:>7.2}", "Request(s) per sec:", s.requests_per_sec)
    }

    fn write_target<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let c = self.config;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "URL:", c.url)?;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Method:", c.method)?;
        if let Some(body) = &c.body {
            writeln!(out, "{:<FIELD_WIDTH$}{}", "Body:", body)?;
        }
        if let Some(content_type) = &c.content_type {
            writeln!(out, "{:<FIELD_WIDTH$}{}", "Content-Type:", content_type)?;
        }
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Concurrency:", c.concurrency)
    }

    fn write_counts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = self.summary;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Total Requests:", s.total_requests)?;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Success:", s.success_count)?;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Failed:", s.failure_count)
    }

    fn write_failure_details<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = self.summary;
        if !s.has_failures() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "--- Failure Details ---")?;
        if !s.status_codes.is_empty() {
            writeln!(out, "Status Codes:")?;
            for (status, count) in &s.status_codes {
                writeln!(out, "  {}: {} requests", status, count)?;
            }
        }
        if !s.errors.is_empty() {
            writeln!(out, "Errors:")?;
            for (error, count) in &s.errors {
                writeln!(out, "  {}: {} requests", error, count)?;
            }
        }
        Ok(())
    }

    fn write_timings<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = self.summary;
        writeln!(out, "Time Taken for Requests:")?;
        writeln!(out, " {:<12} {:<12} {:<12}", "Min", "Avg", "Max")?;
        writeln!(
            out,
            " {:<12} {:<12} {:<12}",
            format_latency(s.min_latency),
            format_latency(s.avg_latency),
            format_latency(s.max_latency)
        )?;
        writeln!(out)?;
        writeln!(out, "{:<FIELD_WIDTH$}{}", "Total Duration:", format_latency(s.total_duration))?;
        writeln!(out, "{:<FIELD_WIDTH$}{:.2}", "Requests/sec:", s.requests_per_sec)
    }

    // false when there was nothing to print
    fn write_distribution<W: Write>(&self, out: &mut W) -> io::Result<bool> {
        let Some(dist) = self.summary.distribution() else {
            return Ok(false);
        };
        writeln!(out, "Latency Distribution:")?;
        writeln!(out, " 50%    {}", format_latency(dist.p50))?;
        writeln!(out, " 75%    {}", format_latency(dist.p75))?;
        writeln!(out, " 90%    {}", format_latency(dist.p90))?;
        writeln!(out, " 99%    {}", format_latency(dist.p99))?;
        Ok(true)
    }

    fn write_histogram<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let buckets = self.summary.histogram();
        if buckets.is_empty() {
            return Ok(());
        }

        writeln!(out, "{:<15} {:<15} {:>10}", "Range (ms)", "Upper Bound", "Requests")?;
        for bucket in buckets {
            writeln!(
                out,
                "{:<15.2} {:<15.2} {:>10}",
                as_millis_f64(bucket.lower),
                as_millis_f64(bucket.upper),
                bucket.count
            )?;
        }
        Ok(())
    }
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

// switch to seconds above 1000ms
pub fn format_latency(duration: Duration) -> String {
    let ms = as_millis_f64(duration);
    if ms > 1000.0 {
        format!("{:.2}s", ms / 1000.0)
    } else {
        format!("{:.2}ms", ms)
    }
}
