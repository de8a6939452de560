//! `candymine holders` - current holder of each mint

use anyhow::Result;
use candymine_core::{LogDiagnostics, ProgressContext, RetryPolicy};
use candymine_holders::RpcClient;
use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct HoldersArgs {
    /// Solana JSON-RPC endpoint
    #[arg(short = 'e', long)]
    pub rpc_url: Option<String>,

    /// Milliseconds to pause after every mint
    #[arg(short, long)]
    pub chill: Option<u64>,
}

pub fn run(args: HoldersArgs, config: &Config, retry: RetryPolicy, progress: &ProgressContext) -> Result<()> {
    let holders_config = candymine_holders::Config {
        rpc_url: args.rpc_url.unwrap_or_else(|| config.rpc.url.clone()),
        chill: config.pacing.chill(args.chill),
        retry,
    };

    let rpc = RpcClient::new(&holders_config.rpc_url);
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();

    candymine_holders::run(
        &holders_config,
        rpc,
        stdin,
        stdout,
        LogDiagnostics,
        progress.stage_line("holders"),
    )?;
    Ok(())
}
