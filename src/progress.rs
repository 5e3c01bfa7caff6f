//! Observers notified as outcomes complete.
//!
//! The dispatcher never draws anything itself; the binary plugs a progress bar
//! in here and tests plug in nothing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::outcome::RequestOutcome;

/// Called from worker tasks, possibly concurrently.
pub trait Progress: Send + Sync {
    fn on_outcome(&self, outcome: &RequestOutcome);

    /// Called once after the last outcome.
    fn finish(&self) {}
}

impl Progress for () {
    fn on_outcome(&self, _outcome: &RequestOutcome) {}
}

impl Progress for ProgressBar {
    fn on_outcome(&self, _outcome: &RequestOutcome) {
        self.inc(1);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

impl Progress for AtomicUsize {
    fn on_outcome(&self, _outcome: &RequestOutcome) {
        self.fetch_add(1, Ordering::Relaxed);
    }
}

impl<T: Progress + ?Sized> Progress for Arc<T> {
    fn on_outcome(&self, outcome: &RequestOutcome) {
        (**self).on_outcome(outcome);
    }

    fn finish(&self) {
        (**self).finish();
    }
}

impl<A: Progress, B: Progress> Progress for (A, B) {
    fn on_outcome(&self, outcome: &RequestOutcome) {
        self.0.on_outcome(outcome);
        self.1.on_outcome(outcome);
    }

    fn finish(&self) {
        self.0.finish();
        self.1.finish();
    }
}

/// Progress bar in the "[####>----] 12/100" style, drawn on stderr.
pub fn request_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("Sending requests [{bar:40}] {pos}/{len}") {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}
