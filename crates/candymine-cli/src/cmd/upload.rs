//! `candymine upload` - push metadata files to permanent storage

use std::path::PathBuf;

use anyhow::Result;
use candymine_core::{LogDiagnostics, ProgressContext, RetryPolicy};
use candymine_store::MetadataDb;
use candymine_upload::{ArweaveKey, HttpBundler};
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Directory of metadata files, one per metadata address
    #[arg(short, long)]
    pub directory: PathBuf,

    /// Arweave wallet key file (JWK)
    #[arg(short, long)]
    pub key_path: PathBuf,

    /// Record uploads in this database and skip already recorded ones
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Bundler node
    #[arg(long)]
    pub bundler_url: Option<String>,

    /// Gateway the printed URIs point at
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Milliseconds to pause after every file
    #[arg(short, long)]
    pub chill: Option<u64>,
}

pub fn run(args: UploadArgs, config: &Config, retry: RetryPolicy, progress: &ProgressContext) -> Result<()> {
    let mut upload_config = candymine_upload::Config::new(args.directory, args.key_path);
    upload_config.db_path = args.db_path.or_else(|| config.store.db_path.clone());
    upload_config.bundler_url = args.bundler_url.unwrap_or_else(|| config.bundler.url.clone());
    upload_config.gateway_url = args.gateway_url.unwrap_or_else(|| config.bundler.gateway.clone());
    upload_config.chill = config.pacing.chill(args.chill);
    upload_config.retry = retry;

    // Everything that can fail at setup fails before the first upload
    let key = ArweaveKey::from_file(&upload_config.key_path)?;
    log::info!("Signing as wallet {}", key.address());
    let db = upload_config
        .db_path
        .as_deref()
        .map(MetadataDb::open)
        .transpose()?;
    let bundler = HttpBundler::new(&upload_config.bundler_url, key);

    candymine_upload::run(
        &upload_config,
        bundler,
        db.as_ref(),
        std::io::stdout().lock(),
        LogDiagnostics,
        progress.stage_line("upload"),
    )?;
    Ok(())
}
