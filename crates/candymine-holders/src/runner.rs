//! Main runner for the holder pipeline

use std::io::{BufRead, Write};

use anyhow::Result;
use candymine_core::{Diagnostics, Driver, Summary};
use indicatif::ProgressBar;

use crate::config::Config;
use crate::input::token_lines;
use crate::resolve::HolderResolver;
use crate::rpc::ChainRpc;
use crate::sink::HolderLines;

/// Resolve every mint read from `input`, writing `owner, mint` lines to `output`.
pub fn run<C, R, W, D>(
    config: &Config,
    rpc: C,
    input: R,
    output: W,
    diagnostics: D,
    pb: ProgressBar,
) -> Result<Summary>
where
    C: ChainRpc,
    R: BufRead,
    W: Write,
    D: Diagnostics,
{
    log::info!(
        "Resolving holders via {} (chill {}ms)",
        config.rpc_url,
        config.chill.as_millis()
    );

    let resolver = HolderResolver::new(rpc);
    let mut sink = HolderLines::new(output);
    let mut driver = Driver::with_diagnostics(&resolver, config.retry, config.chill, diagnostics)
        .progress(pb);

    let summary = driver.run(token_lines(input), &mut sink)?;
    summary.log("Holder");
    Ok(summary)
}
