//! Runners for the two mining passes

use anyhow::{Context, Result, bail};
use candymine_core::{
    Diagnostics, Driver, FailedAttempt, ItemOutcome, RequestError, RetryPolicy, Summary, retry,
};
use candymine_store::MetadataDb;
use indicatif::ProgressBar;

use crate::config::Config;
use crate::metadata::{MetadataMiner, TokenRow};
use crate::metaplex::pubkey_bytes;
use crate::rpc::MetadataRpc;
use crate::sink::MinedRows;
use crate::tokens::{MetadataAccount, TokenMiner};

/// Mine the token of every metadata account `update_authority` controls.
///
/// Listing the accounts is one retried call; if it never succeeds the run
/// fails. Accounts whose token is already in `db` are skipped.
pub fn run_tokens<C, D>(
    config: &Config,
    rpc: C,
    update_authority: &str,
    db: &MetadataDb,
    diagnostics: D,
    pb: ProgressBar,
) -> Result<Summary>
where
    C: MetadataRpc,
    D: Diagnostics,
{
    pubkey_bytes(update_authority).context("Invalid update authority")?;

    log::info!(
        "Listing metadata accounts of {update_authority} via {}",
        config.rpc_url
    );
    let mut accounts = list_metadata_accounts(&rpc, update_authority, &config.retry)?;
    accounts.sort();
    accounts.dedup();
    let listed = accounts.len();

    let known = db.known_metadata_addresses()?;
    accounts.retain(|a| !known.contains(a));
    if accounts.len() < listed {
        log::info!("Skipping {} already mined", listed - accounts.len());
    }

    log::info!(
        "Mining {} tokens of {listed} metadata accounts (chill {}ms)",
        accounts.len(),
        config.chill.as_millis()
    );
    pb.set_length(accounts.len() as u64);

    let resolver = TokenMiner::new(rpc);
    let mut sink = MinedRows::new(db);
    let mut driver = Driver::with_diagnostics(&resolver, config.retry, config.chill, diagnostics)
        .progress(pb);

    let items = accounts.into_iter().map(|a| Ok(MetadataAccount::new(a)));
    let summary = driver.run(items, &mut sink)?;
    summary.log("Token");
    Ok(summary)
}

/// Fetch and decode the metadata of every mined token that has none yet,
/// oldest token first.
pub fn run_metadata<C, D>(
    config: &Config,
    rpc: C,
    db: &MetadataDb,
    diagnostics: D,
    pb: ProgressBar,
) -> Result<Summary>
where
    C: MetadataRpc,
    D: Diagnostics,
{
    let pending = db.tokens_missing_metadata()?;
    log::info!(
        "Fetching metadata of {} tokens via {} (chill {}ms)",
        pending.len(),
        config.rpc_url,
        config.chill.as_millis()
    );
    pb.set_length(pending.len() as u64);

    let resolver = MetadataMiner::new(rpc);
    let mut sink = MinedRows::new(db);
    let mut driver = Driver::with_diagnostics(&resolver, config.retry, config.chill, diagnostics)
        .progress(pb);

    let items = pending.into_iter().map(|t| Ok(TokenRow::from(t)));
    let summary = driver.run(items, &mut sink)?;
    summary.log("Metadata");
    Ok(summary)
}

fn list_metadata_accounts<C: MetadataRpc>(
    rpc: &C,
    update_authority: &str,
    policy: &RetryPolicy,
) -> Result<Vec<String>> {
    let outcome = retry(
        policy,
        |_| rpc.metadata_accounts_by_update_authority(update_authority),
        |e| !matches!(e, RequestError::Decode(_)),
        |f: &FailedAttempt<'_, RequestError>| {
            log::warn!(
                "Listing metadata accounts: attempt {}/{} failed: {}",
                f.attempt,
                f.max_attempts,
                f.error
            )
        },
    );
    match outcome {
        ItemOutcome::Succeeded { value, .. } => Ok(value),
        ItemOutcome::Exhausted { error, attempts } => {
            bail!("Failed to list metadata accounts after {attempts} attempts: {error}")
        }
    }
}
