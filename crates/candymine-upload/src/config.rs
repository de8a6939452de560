//! Upload pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

use candymine_core::RetryPolicy;

use crate::bundler::{DEFAULT_BUNDLER_URL, DEFAULT_GATEWAY_URL};

/// Default pause between files, in milliseconds
pub const DEFAULT_CHILL_MS: u64 = 100;

/// Runtime configuration for the upload pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one metadata file per address
    pub directory: PathBuf,
    /// Arweave wallet (JWK)
    pub key_path: PathBuf,
    /// Record uploads here and skip addresses already recorded
    pub db_path: Option<PathBuf>,
    pub bundler_url: String,
    /// Base of the printed URIs
    pub gateway_url: String,
    /// Pause after every uploaded file, success or not
    pub chill: Duration,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new(directory: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            key_path: key_path.into(),
            db_path: None,
            bundler_url: DEFAULT_BUNDLER_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            chill: Duration::from_millis(DEFAULT_CHILL_MS),
            retry: RetryPolicy::default(),
        }
    }
}
