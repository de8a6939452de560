//! Mining pipeline configuration

use std::time::Duration;

use candymine_core::RetryPolicy;
use candymine_holders::rpc::DEFAULT_RPC_URL;

/// Default pause between accounts, in milliseconds
pub const DEFAULT_CHILL_MS: u64 = 100;

/// Runtime configuration shared by both mining passes
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Pause after every account, success or not
    pub chill: Duration,
    /// Attempt ceiling and spacing per account
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chill: Duration::from_millis(DEFAULT_CHILL_MS),
            retry: RetryPolicy::default(),
        }
    }
}
