//! Both mining passes against an in-memory chain and a temporary database.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

use candymine_core::{Diagnostics, RequestError, RetryPolicy};
use candymine_mine::metaplex::METADATA_V1_KEY;
use candymine_mine::{Config, MetadataRpc, SignatureInfo, TransactionInfo, run_metadata, run_tokens};
use candymine_store::MetadataDb;
use indicatif::ProgressBar;
use tempfile::TempDir;

fn addr(byte: u8) -> String {
    bs58::encode([byte; 32]).into_string()
}

/// Borsh bytes of a `MetadataV1` account with one creator.
fn metadata_account(mint: u8, name: &str, uri: &str) -> Vec<u8> {
    let mut data = vec![METADATA_V1_KEY];
    data.extend_from_slice(&[1; 32]);
    data.extend_from_slice(&[mint; 32]);
    for (s, width) in [(name, 32), ("CNDY", 10), (uri, 200)] {
        data.extend_from_slice(&(width as u32).to_le_bytes());
        data.extend_from_slice(s.as_bytes());
        data.resize(data.len() + width - s.len(), 0);
    }
    data.extend_from_slice(&500u16.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&[9; 32]);
    data.extend_from_slice(&[1, 100]);
    data.extend_from_slice(&[1, 1, 1, 255]);
    data.resize(679, 0);
    data
}

/// Metadata account -> (genesis block time, mint); accounts listed under
/// the authority but absent here have no signatures.
#[derive(Default)]
struct MemoryChain {
    listed: Vec<String>,
    tokens: HashMap<String, (i64, u8)>,
    accounts: HashMap<String, Vec<u8>>,
    listing_failures: Cell<u32>,
    signature_calls: RefCell<Vec<String>>,
    account_calls: RefCell<Vec<String>>,
}

impl MemoryChain {
    fn token(mut self, metadata: u8, block_time: i64, mint: u8, uri: &str) -> Self {
        let address = addr(metadata);
        self.listed.push(address.clone());
        self.tokens.insert(address.clone(), (block_time, mint));
        self.accounts
            .insert(address, metadata_account(mint, &format!("Candy #{mint}"), uri));
        self
    }

    fn unminted(mut self, metadata: u8) -> Self {
        self.listed.push(addr(metadata));
        self
    }

    fn failing_listing(self, times: u32) -> Self {
        self.listing_failures.set(times);
        self
    }
}

impl MetadataRpc for &MemoryChain {
    fn metadata_accounts_by_update_authority(&self, authority: &str) -> Result<Vec<String>, RequestError> {
        assert_eq!(authority, addr(1));
        let left = self.listing_failures.get();
        if left > 0 {
            self.listing_failures.set(left - 1);
            return Err(RequestError::Http {
                status: Some(503),
                message: "Service Unavailable".into(),
            });
        }
        Ok(self.listed.clone())
    }

    fn signatures_for_address(&self, address: &str) -> Result<Vec<SignatureInfo>, RequestError> {
        self.signature_calls.borrow_mut().push(address.to_string());
        Ok(match self.tokens.get(address) {
            Some((block_time, _)) => vec![
                SignatureInfo {
                    signature: format!("update-{address}"),
                    block_time: Some(block_time + 50),
                },
                SignatureInfo {
                    signature: format!("mint-{address}"),
                    block_time: Some(*block_time),
                },
            ],
            None => vec![],
        })
    }

    fn transaction(&self, signature: &str) -> Result<Option<TransactionInfo>, RequestError> {
        let metadata = signature
            .strip_prefix("mint-")
            .expect("only the genesis transaction is fetched");
        Ok(self.tokens.get(metadata).map(|(_, mint)| TransactionInfo {
            account_keys: vec![addr(2), addr(*mint), metadata.to_string()],
            instruction_count: 5,
        }))
    }

    fn account_data(&self, address: &str) -> Result<Option<Vec<u8>>, RequestError> {
        self.account_calls.borrow_mut().push(address.to_string());
        Ok(self.accounts.get(address).cloned())
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

fn config() -> Config {
    Config {
        chill: Duration::ZERO,
        retry: RetryPolicy::with_min_backoff(Duration::ZERO),
        ..Config::default()
    }
}

fn temp_db() -> (TempDir, MetadataDb) {
    let dir = tempfile::tempdir().unwrap();
    let db = MetadataDb::open(&dir.path().join("candy-holders.db")).unwrap();
    (dir, db)
}

#[test]
fn mined_tokens_feed_metadata_and_links() {
    let chain = MemoryChain::default()
        .token(10, 2_000, 20, "https://arweave.net/late")
        .unminted(12)
        .token(11, 1_000, 21, "https://arweave.net/early");
    let (_dir, db) = temp_db();

    let mut recorded = Recorded::default();
    let summary = run_tokens(&config(), &chain, &addr(1), &db, &mut recorded, ProgressBar::hidden()).unwrap();
    assert_eq!((summary.total, summary.resolved, summary.unresolved), (3, 2, 1));
    assert_eq!(recorded.unresolved, vec![addr(12)]);
    assert!(recorded.failures.is_empty());

    let summary = run_metadata(&config(), &chain, &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    assert_eq!(summary.resolved, 2);
    // Oldest genesis first
    assert_eq!(*chain.account_calls.borrow(), vec![addr(11), addr(10)]);

    let creators = db.creators(&addr(10)).unwrap();
    assert_eq!(creators.len(), 1);
    assert_eq!(creators[0].address, addr(9));
    assert_eq!(creators[0].share, 100);

    db.record_repair(&addr(10), "https://arweave.net/fixed").unwrap();
    let mut uris: Vec<(String, bool)> = db
        .links()
        .unwrap()
        .into_iter()
        .map(|l| (l.uri, l.repaired))
        .collect();
    uris.sort();
    assert_eq!(
        uris,
        vec![
            ("https://arweave.net/early".to_string(), false),
            ("https://arweave.net/fixed".to_string(), true),
        ]
    );
}

#[test]
fn rerun_skips_known_tokens_and_metadata() {
    let chain = MemoryChain::default()
        .token(10, 2_000, 20, "https://arweave.net/a")
        .unminted(12);
    let (_dir, db) = temp_db();

    run_tokens(&config(), &chain, &addr(1), &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    run_metadata(&config(), &chain, &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    chain.signature_calls.borrow_mut().clear();
    chain.account_calls.borrow_mut().clear();

    let summary = run_tokens(&config(), &chain, &addr(1), &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    // Only the account that never resolved is looked at again
    assert_eq!(summary.total, 1);
    assert_eq!(*chain.signature_calls.borrow(), vec![addr(12)]);

    let summary = run_metadata(&config(), &chain, &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    assert_eq!(summary.total, 0);
    assert!(chain.account_calls.borrow().is_empty());
}

#[test]
fn transient_listing_failures_are_retried() {
    let chain = MemoryChain::default()
        .token(10, 2_000, 20, "https://arweave.net/a")
        .failing_listing(2);
    let (_dir, db) = temp_db();

    let summary = run_tokens(&config(), &chain, &addr(1), &db, &mut Recorded::default(), ProgressBar::hidden()).unwrap();
    assert_eq!(summary.resolved, 1);
}

#[test]
fn exhausted_listing_is_fatal() {
    let chain = MemoryChain::default()
        .token(10, 2_000, 20, "https://arweave.net/a")
        .failing_listing(u32::MAX);
    let (_dir, db) = temp_db();

    let err = run_tokens(&config(), &chain, &addr(1), &db, &mut Recorded::default(), ProgressBar::hidden())
        .unwrap_err();
    assert!(err.to_string().contains("after 5 attempts"), "{err}");
    assert!(chain.signature_calls.borrow().is_empty());
    assert!(db.known_metadata_addresses().unwrap().is_empty());
}

#[test]
fn invalid_update_authority_fails_before_any_call() {
    let chain = MemoryChain::default().failing_listing(u32::MAX);
    let (_dir, db) = temp_db();

    let err = run_tokens(&config(), &chain, "not-a-key", &db, &mut Recorded::default(), ProgressBar::hidden())
        .unwrap_err();
    assert!(err.to_string().contains("Invalid update authority"));
    assert_eq!(chain.listing_failures.get(), u32::MAX);
}
