//! End-to-end holder pipeline runs against an in-memory chain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::io::Cursor;
use std::time::{Duration, Instant};

use candymine_core::{Diagnostics, RequestError, RetryPolicy};
use candymine_holders::rpc::decode_response;
use candymine_holders::{AccountInfo, ChainRpc, Config, TokenAccountBalance, run};
use indicatif::ProgressBar;
use serde_json::json;

/// Mint -> owner map; mints in `broken` fail a set number of times first.
#[derive(Default)]
struct MemoryChain {
    owners: HashMap<String, String>,
    broken: RefCell<HashMap<String, u32>>,
    /// Mints whose largest-accounts reply is missing the account address
    garbled: Vec<String>,
    calls: RefCell<Vec<(String, Instant)>>,
}

impl MemoryChain {
    fn owner(mut self, mint: &str, owner: &str) -> Self {
        self.owners.insert(mint.to_string(), owner.to_string());
        self
    }

    fn failing(self, mint: &str, times: u32) -> Self {
        self.broken.borrow_mut().insert(mint.to_string(), times);
        self
    }

    fn garbled(mut self, mint: &str) -> Self {
        self.garbled.push(mint.to_string());
        self
    }

    fn first_call_of(&self, mint: &str) -> Instant {
        self.calls
            .borrow()
            .iter()
            .find(|(m, _)| m == mint)
            .map(|(_, t)| *t)
            .expect("mint never queried")
    }
}

impl ChainRpc for &MemoryChain {
    fn get_token_largest_accounts(&self, mint: &str) -> Result<Vec<TokenAccountBalance>, RequestError> {
        self.calls.borrow_mut().push((mint.to_string(), Instant::now()));
        if let Some(left) = self.broken.borrow_mut().get_mut(mint) {
            if *left > 0 {
                *left -= 1;
                return Err(RequestError::Http {
                    status: Some(429),
                    message: "Too Many Requests".into(),
                });
            }
        }
        if self.garbled.iter().any(|m| m == mint) {
            return decode_response(
                r#"{"jsonrpc":"2.0","result":[{"amount":"1","decimals":0}],"id":1}"#,
            );
        }
        Ok(match self.owners.get(mint) {
            Some(_) => vec![TokenAccountBalance {
                address: format!("pda-{mint}"),
                amount: "1".into(),
                decimals: 0,
            }],
            None => vec![],
        })
    }

    fn get_parsed_account_info(&self, address: &str) -> Result<Option<AccountInfo>, RequestError> {
        let mint = address.trim_start_matches("pda-");
        Ok(self.owners.get(mint).map(|owner| AccountInfo {
            data: json!({ "parsed": { "info": { "owner": owner, "mint": mint }, "type": "account" } }),
            owner: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".into(),
            lamports: 2039280,
        }))
    }
}

#[derive(Default)]
struct Recorded {
    failures: Vec<String>,
    unresolved: Vec<String>,
}

impl Diagnostics for &mut Recorded {
    fn failed_attempt(&mut self, item: &str, _attempt: u32, _max: u32, _error: &dyn Display) {
        self.failures.push(item.to_string());
    }

    fn unresolved(&mut self, item: &str, _reason: &str) {
        self.unresolved.push(item.to_string());
    }
}

fn config(chill: Duration) -> Config {
    Config {
        chill,
        retry: RetryPolicy::with_min_backoff(Duration::ZERO),
        ..Config::default()
    }
}

fn run_lines(chain: &MemoryChain, input: &str, chill: Duration) -> (String, Recorded) {
    let mut recorded = Recorded::default();
    let mut out = Vec::new();
    run(
        &config(chill),
        chain,
        Cursor::new(input.to_string()),
        &mut out,
        &mut recorded,
        ProgressBar::hidden(),
    )
    .expect("pipeline should not fail");
    (String::from_utf8(out).unwrap(), recorded)
}

#[test]
fn always_failing_mint_is_dropped() {
    let chain = MemoryChain::default()
        .owner("addr2", "ownerX")
        .failing("addr1", u32::MAX);

    let (out, recorded) = run_lines(&chain, "addr1\naddr2\n", Duration::ZERO);

    assert_eq!(out, "ownerX, addr2\n");
    assert_eq!(recorded.failures, vec!["addr1"; 5]);
    assert!(recorded.unresolved.is_empty());
}

#[test]
fn flaky_mint_appears_once() {
    let chain = MemoryChain::default()
        .owner("m1", "w1")
        .owner("m2", "w2")
        .failing("m1", 3);

    let (out, recorded) = run_lines(&chain, "m1\nm2\n", Duration::ZERO);

    assert_eq!(out, "w1, m1\nw2, m2\n");
    assert_eq!(recorded.failures.len(), 3);
}

#[test]
fn order_follows_input() {
    let chain = MemoryChain::default()
        .owner("c", "wc")
        .owner("a", "wa")
        .owner("b", "wb")
        .failing("b", u32::MAX);

    let (out, _) = run_lines(&chain, "1 c\n2 b\n3 a\n", Duration::ZERO);

    assert_eq!(out, "wc, c\nwa, a\n");
}

#[test]
fn unknown_mint_is_unresolved_without_retry() {
    let chain = MemoryChain::default().owner("known", "w");

    let (out, recorded) = run_lines(&chain, "ghost\nknown\n", Duration::ZERO);

    assert_eq!(out, "w, known\n");
    assert_eq!(recorded.unresolved, vec!["ghost"]);
    assert!(recorded.failures.is_empty());
    assert_eq!(chain.calls.borrow().len(), 2);
}

#[test]
fn chill_elapses_between_items() {
    let chill = Duration::from_millis(60);
    let chain = MemoryChain::default()
        .owner("a", "wa")
        .owner("b", "wb")
        .failing("a", u32::MAX);

    let (out, _) = run_lines(&chain, "a\nb\n", chill);

    assert_eq!(out, "wb, b\n");
    let last_a = chain
        .calls
        .borrow()
        .iter()
        .filter(|(m, _)| m == "a")
        .map(|(_, t)| *t)
        .last()
        .unwrap();
    assert!(chain.first_call_of("b").duration_since(last_a) >= chill);
}

#[test]
fn malformed_reply_is_dropped_without_retry() {
    let chain = MemoryChain::default().owner("ok", "w").garbled("bad");

    let (out, recorded) = run_lines(&chain, "bad\nok\n", Duration::ZERO);

    assert_eq!(out, "w, ok\n");
    assert!(recorded.failures.is_empty());
    assert_eq!(recorded.unresolved, vec!["bad"]);
    let bad_calls = chain.calls.borrow().iter().filter(|(m, _)| m == "bad").count();
    assert_eq!(bad_calls, 1);
}
