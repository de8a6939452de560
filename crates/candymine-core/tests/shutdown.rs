//! A requested shutdown stops the driver before the next item.
//!
//! Lives in its own test binary because the flag is process-wide.

use std::cell::Cell;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use candymine_core::{Driver, Resolution, Resolver, RetryPolicy, Sink, WorkItem, shutdown_flag};

struct Mint(&'static str);

impl WorkItem for Mint {
    fn label(&self) -> &str {
        self.0
    }
}

/// Resolves every item, requesting shutdown while handling `stop_at`.
struct StopAfter {
    stop_at: &'static str,
    calls: Cell<u32>,
}

impl Resolver for StopAfter {
    type Item = Mint;
    type Value = String;
    type Error = String;

    fn resolve(&self, item: &Mint) -> Result<Resolution<String>, String> {
        self.calls.set(self.calls.get() + 1);
        if item.0 == self.stop_at {
            shutdown_flag().store(true, Ordering::Relaxed);
        }
        Ok(Resolution::Resolved(format!("owner-{}", item.0)))
    }
}

struct Lines(Vec<String>);

impl Sink<Mint, String> for Lines {
    fn emit(&mut self, item: &Mint, value: &String) -> Result<()> {
        self.0.push(format!("{value}, {}", item.0));
        Ok(())
    }
}

#[test]
fn current_item_finishes_then_run_stops() {
    let resolver = StopAfter {
        stop_at: "b",
        calls: Cell::new(0),
    };
    let mut sink = Lines(Vec::new());
    let mut driver = Driver::new(
        &resolver,
        RetryPolicy::with_min_backoff(Duration::ZERO),
        Duration::ZERO,
    );

    let items = ["a", "b", "c", "d"].into_iter().map(|m| Ok(Mint(m)));
    let summary = driver.run(items, &mut sink).unwrap();

    assert_eq!(sink.0, vec!["owner-a, a", "owner-b, b"]);
    assert_eq!(resolver.calls.get(), 2);
    assert!(summary.interrupted);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.resolved, 2);
}
