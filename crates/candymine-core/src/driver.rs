//! Sequential iteration driver shared by the pipelines.
//!
//! Pulls one work item at a time, runs it through [`retry`], hands a
//! resolved value to the [`Sink`], then sleeps the chill delay before the
//! next item. Order of emitted records always matches input order.

use std::fmt::Display;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::ProgressBar;

use crate::error::RequestError;
use crate::retry::{FailedAttempt, ItemOutcome, RetryPolicy, retry};
use crate::shutdown::{is_shutdown_requested, sleep_unless_shutdown};

/// A unit of input with a printable identifier for diagnostics.
pub trait WorkItem {
    fn label(&self) -> &str;
}

/// Outcome of a lookup that reached the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<V> {
    Resolved(V),
    /// The response arrived but did not carry a usable value
    Unresolved(String),
}

/// Turn a reply that arrived but did not decode into `Unresolved`.
///
/// Transport and RPC errors pass through unchanged and stay retryable.
pub fn unresolved_on_decode<V>(
    result: Result<Resolution<V>, RequestError>,
) -> Result<Resolution<V>, RequestError> {
    match result {
        Err(RequestError::Decode(message)) => Ok(Resolution::Unresolved(format!(
            "malformed response: {message}"
        ))),
        other => other,
    }
}

/// The per-item remote operation.
pub trait Resolver {
    type Item: WorkItem;
    type Value;
    type Error: Display;

    fn resolve(&self, item: &Self::Item) -> Result<Resolution<Self::Value>, Self::Error>;

    /// Whether a failed attempt is worth repeating. Everything is, by default.
    fn is_retryable(&self, _error: &Self::Error) -> bool {
        true
    }
}

/// Destination of resolved records. Errors here abort the run.
pub trait Sink<I, V> {
    fn emit(&mut self, item: &I, value: &V) -> Result<()>;
}

/// Receiver of per-item diagnostics.
pub trait Diagnostics {
    fn failed_attempt(&mut self, item: &str, attempt: u32, max_attempts: u32, error: &dyn Display);
    fn unresolved(&mut self, item: &str, reason: &str);
}

/// Writes diagnostics through the `log` facade (stderr).
#[derive(Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn failed_attempt(&mut self, item: &str, attempt: u32, max_attempts: u32, error: &dyn Display) {
        if attempt < max_attempts {
            log::warn!("{item}: attempt {attempt}/{max_attempts} failed: {error}");
        } else {
            log::warn!("{item}: attempt {attempt}/{max_attempts} failed: {error}, dropping");
        }
    }

    fn unresolved(&mut self, item: &str, reason: &str) {
        log::warn!("{item}: no value resolved ({reason}), dropping");
    }
}

/// Counts for one driver run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub exhausted: usize,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl Summary {
    pub fn dropped(&self) -> usize {
        self.unresolved + self.exhausted
    }

    /// Log the summary block at info level.
    pub fn log(&self, title: &str) {
        log::info!("=== {title} Summary ===");
        log::info!(
            "Items: {}/{} resolved ({} unresolved, {} failed)",
            self.resolved,
            self.total,
            self.unresolved,
            self.exhausted
        );
        if self.interrupted {
            log::warn!("Run interrupted before the input was exhausted");
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}

/// Sequential driver over one resolver.
pub struct Driver<'a, R, D = LogDiagnostics> {
    resolver: &'a R,
    policy: RetryPolicy,
    chill: Duration,
    diagnostics: D,
    pb: ProgressBar,
}

impl<'a, R: Resolver> Driver<'a, R, LogDiagnostics> {
    pub fn new(resolver: &'a R, policy: RetryPolicy, chill: Duration) -> Self {
        Self::with_diagnostics(resolver, policy, chill, LogDiagnostics)
    }
}

impl<'a, R: Resolver, D: Diagnostics> Driver<'a, R, D> {
    pub fn with_diagnostics(resolver: &'a R, policy: RetryPolicy, chill: Duration, diagnostics: D) -> Self {
        Self {
            resolver,
            policy,
            chill,
            diagnostics,
            pb: ProgressBar::hidden(),
        }
    }

    /// Report progress on this bar (hidden by default).
    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Drive every item to a terminal state.
    ///
    /// An `Err` from the item source or the sink is fatal and returned as is;
    /// per-item lookup failures are reported and dropped.
    pub fn run<I, S>(&mut self, items: I, sink: &mut S) -> Result<Summary>
    where
        I: IntoIterator<Item = Result<R::Item>>,
        S: Sink<R::Item, R::Value>,
    {
        let start = Instant::now();
        let mut summary = Summary::default();

        for item in items {
            if is_shutdown_requested() {
                summary.interrupted = true;
                break;
            }
            let item = item?;
            summary.total += 1;
            self.pb.set_message(format!("{} ...", item.label()));

            match self.process(&item) {
                Some(Resolution::Resolved(value)) => {
                    sink.emit(&item, &value)?;
                    summary.resolved += 1;
                }
                Some(Resolution::Unresolved(reason)) => {
                    self.diagnostics.unresolved(item.label(), &reason);
                    summary.unresolved += 1;
                }
                None => summary.exhausted += 1,
            }

            self.pb.inc(1);
            self.pb.set_message(format!(
                "{} done, {} dropped",
                summary.resolved,
                summary.dropped()
            ));

            // Courtesy throttle, applied whatever the outcome
            sleep_unless_shutdown(self.chill);
        }

        summary.elapsed = start.elapsed();
        self.pb.finish_and_clear();
        Ok(summary)
    }

    fn process(&mut self, item: &R::Item) -> Option<Resolution<R::Value>> {
        let resolver = self.resolver;
        let diagnostics = &mut self.diagnostics;
        let label = item.label();

        let outcome = retry(
            &self.policy,
            |_| resolver.resolve(item),
            |e| resolver.is_retryable(e),
            |f: &FailedAttempt<'_, R::Error>| {
                diagnostics.failed_attempt(label, f.attempt, f.max_attempts, f.error)
            },
        );

        match outcome {
            ItemOutcome::Succeeded { value, attempts } => {
                if attempts > 1 {
                    log::debug!("{label}: succeeded on attempt {attempts}");
                }
                Some(value)
            }
            ItemOutcome::Exhausted { .. } => None,
        }
    }
}
