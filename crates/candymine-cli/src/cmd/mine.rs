//! `candymine mine` - fill the metadata database from the chain

use std::path::PathBuf;

use anyhow::Result;
use candymine_core::{LogDiagnostics, ProgressContext, RetryPolicy};
use candymine_holders::RpcClient;
use candymine_store::{DEFAULT_DB_PATH, MetadataDb};
use clap::{Args, Subcommand};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct MineArgs {
    #[command(subcommand)]
    pub pass: MinePass,

    /// Solana JSON-RPC endpoint
    #[arg(short = 'e', long, global = true)]
    pub rpc_url: Option<String>,

    /// Metadata database (default: candy-holders.db)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Milliseconds to pause after every account
    #[arg(short, long, global = true)]
    pub chill: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum MinePass {
    /// Find the token of every metadata account an update authority controls
    Tokens {
        /// Update authority of the collection (base58)
        #[arg(short, long)]
        update_authority: String,
    },
    /// Fetch and decode the metadata account of every mined token
    Metadata,
}

pub fn run(args: MineArgs, config: &Config, retry: RetryPolicy, progress: &ProgressContext) -> Result<()> {
    let mine_config = candymine_mine::Config {
        rpc_url: args.rpc_url.unwrap_or_else(|| config.rpc.url.clone()),
        chill: config.pacing.chill(args.chill),
        retry,
    };
    let path = args
        .db_path
        .or_else(|| config.store.db_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    let db = MetadataDb::open(&path)?;
    let rpc = RpcClient::new(&mine_config.rpc_url);

    match args.pass {
        MinePass::Tokens { update_authority } => {
            candymine_mine::run_tokens(
                &mine_config,
                rpc,
                &update_authority,
                &db,
                LogDiagnostics,
                progress.stage_line("tokens"),
            )?;
        }
        MinePass::Metadata => {
            candymine_mine::run_metadata(
                &mine_config,
                rpc,
                &db,
                LogDiagnostics,
                progress.stage_line("metadata"),
            )?;
        }
    }
    Ok(())
}
