//! Candymine Holders - current holder of each token mint
//!
//! Reads mints line by line, asks a Solana RPC node for the largest token
//! account of each, and prints the wallet that owns it.
//!
//! # Example
//!
//! ```ignore
//! use candymine_holders::{Config, RpcClient, run};
//!
//! let config = Config::default();
//! let rpc = RpcClient::new(&config.rpc_url);
//! let stdin = std::io::stdin().lock();
//! let summary = run(&config, rpc, stdin, std::io::stdout(), LogDiagnostics, ProgressBar::hidden())?;
//! ```

pub mod config;
pub mod input;
pub mod resolve;
pub mod rpc;
pub mod runner;
pub mod sink;

// Re-exports
pub use config::Config;
pub use input::{TokenLine, token_lines};
pub use resolve::HolderResolver;
pub use rpc::{AccountInfo, ChainRpc, ParsedTokenAccount, RpcClient, TokenAccountBalance};
pub use runner::run;
pub use sink::HolderLines;
