//! `candymine links` - effective metadata URI per token

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use candymine_store::{DEFAULT_DB_PATH, MetadataDb};
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct LinksArgs {
    /// Metadata database (default: candy-holders.db)
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

pub fn run(args: LinksArgs, config: &Config) -> Result<()> {
    let path = args
        .db_path
        .or_else(|| config.store.db_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    // Read-only: a wrong path is an error, not a fresh empty database
    let db = MetadataDb::open_read_only(&path)?;
    let links = db.links()?;

    let repaired = links.iter().filter(|l| l.repaired).count();
    let mut out = std::io::stdout().lock();
    for link in &links {
        writeln!(out, "{}", link.uri).context("Failed to write output")?;
    }
    out.flush().context("Failed to flush output")?;

    log::info!("{} links ({repaired} re-uploaded)", links.len());
    Ok(())
}
