//! Per-item progress reporting.
//!
//! The orchestrator asks a [`ProgressReporter`] for one [`ProgressHandle`] per
//! dispatched request and hands it to the fetcher working on that request.
//! Handles are never shared, so reporters only need whatever synchronisation
//! their display layer already has.

use crate::fetch::{FetchError, FetchOutcome, FetchRequest};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub trait ProgressReporter: Send + Sync {
    fn track(&self, request: &FetchRequest) -> Box<dyn ProgressHandle>;
}

pub trait ProgressHandle: Send {
    /// A response arrived for `attempt` (0-indexed). `total_bytes` is `None`
    /// when the size is unknown.
    fn attempt_started(&mut self, attempt: u32, total_bytes: Option<u64>);

    fn advanced(&mut self, bytes: u64);

    /// `attempt` failed and the next one starts after `delay`.
    fn retry_scheduled(&mut self, attempt: u32, delay: Duration, error: &FetchError);

    fn finished(&mut self, outcome: &FetchOutcome);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

struct SilentHandle;

impl ProgressReporter for SilentProgress {
    fn track(&self, _request: &FetchRequest) -> Box<dyn ProgressHandle> {
        Box::new(SilentHandle)
    }
}

impl ProgressHandle for SilentHandle {
    fn attempt_started(&mut self, _attempt: u32, _total_bytes: Option<u64>) {}
    fn advanced(&mut self, _bytes: u64) {}
    fn retry_scheduled(&mut self, _attempt: u32, _delay: Duration, _error: &FetchError) {}
    fn finished(&mut self, _outcome: &FetchOutcome) {}
}

const BAR_TEMPLATE: &str =
    "{prefix:<25.cyan.bold} {percent:>3}% [{wide_bar:.cyan/blue}] {binary_bytes}/{binary_total_bytes} ({eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{prefix:<25.cyan.bold} {spinner:.blue} {binary_bytes} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░  ";

/// Renders one terminal bar per attempt. Unknown sizes get a spinner instead
/// of a bar that would look complete at zero bytes.
#[derive(Clone)]
pub struct TerminalProgress {
    multi: MultiProgress,
    bar_style: ProgressStyle,
    spinner_style: ProgressStyle,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalProgress {
    pub fn new() -> Self {
        let bar_style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|s| s.progress_chars(PROGRESS_CHARS))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let spinner_style = ProgressStyle::with_template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        Self {
            multi: MultiProgress::new(),
            bar_style,
            spinner_style,
        }
    }
}

impl ProgressReporter for TerminalProgress {
    fn track(&self, request: &FetchRequest) -> Box<dyn ProgressHandle> {
        Box::new(TerminalHandle {
            progress: self.clone(),
            label: request.artifact_name.clone(),
            bar: None,
        })
    }
}

struct TerminalHandle {
    progress: TerminalProgress,
    label: String,
    bar: Option<ProgressBar>,
}

impl ProgressHandle for TerminalHandle {
    fn attempt_started(&mut self, attempt: u32, total_bytes: Option<u64>) {
        if let Some(previous) = self.bar.take() {
            previous.finish_and_clear();
        }

        let bar = match total_bytes {
            Some(total) => ProgressBar::new(total).with_style(self.progress.bar_style.clone()),
            None => {
                let bar = ProgressBar::new_spinner().with_style(self.progress.spinner_style.clone());
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            }
        };
        let bar = self.progress.multi.add(bar);
        bar.set_prefix(self.label.clone());
        if attempt > 0 {
            bar.set_message(format!("attempt {}", attempt + 1));
        }
        self.bar = Some(bar);
    }

    fn advanced(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn retry_scheduled(&mut self, attempt: u32, delay: Duration, error: &FetchError) {
        let message = format!("attempt {} failed ({error}), retrying in {delay:?}", attempt + 1);
        match &self.bar {
            Some(bar) => bar.set_message(message),
            None => {
                let _ = self.progress.multi.println(format!("{}: {message}", self.label));
            }
        }
    }

    fn finished(&mut self, outcome: &FetchOutcome) {
        let Some(bar) = self.bar.take() else {
            return;
        };
        match outcome {
            FetchOutcome::Succeeded => bar.finish_with_message("done"),
            FetchOutcome::Skipped => bar.finish_and_clear(),
            FetchOutcome::Failed(error) => bar.abandon_with_message(format!("failed: {error}")),
        }
    }
}
