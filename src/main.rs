use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reqbench::config::Args;
use reqbench::progress::request_bar;
use reqbench::{run, BenchmarkConfig, Report};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        )
        .init();

    let args = Args::parse();

    if let Err(err) = try_main(&args) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn try_main(args: &Args) -> Result<()> {
    let config = BenchmarkConfig::try_from(args)?;

    let completed = Arc::new(AtomicUsize::new(0));
    let completed_clone = Arc::clone(&completed);
    let total = config.requests;
    ctrlc
        ::set_handler(move || {
            eprintln!(
                "\nInterrupted after {} of {} requests",
                completed_clone.load(Ordering::Relaxed),
                total
            );
            std::process::exit(130);
        })
        .context("failed to set Ctrl+C handler")?;

    println!(
        "Sending {} request(s) to {} using {} worker(s)",
        config.requests,
        config.url,
        config.concurrency
    );

    let summary = if args.quiet {
        run(&config, completed)?
    } else {
        run(&config, (request_bar(config.requests), completed))?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Report::new(&config, &summary).write(&mut out, args.summarize)?;
    out.flush()?;
    Ok(())
}
