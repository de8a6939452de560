//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use candymine_core::RetryPolicy;
use serde::Deserialize;

/// Global configuration for candymine
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcConfig,
    pub bundler: BundlerConfig,
    pub pacing: PacingConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: candymine_holders::rpc::DEFAULT_RPC_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    pub url: String,
    pub gateway: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            url: candymine_upload::DEFAULT_BUNDLER_URL.to_string(),
            gateway: candymine_upload::DEFAULT_GATEWAY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause after every item
    pub chill_ms: u64,
    /// Wait before the second attempt of an item, doubled for each further one
    pub retry_backoff_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            chill_ms: candymine_holders::config::DEFAULT_CHILL_MS,
            retry_backoff_ms: RetryPolicy::default().min_backoff.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Metadata database. Uploads only record into it when set; mining and
    /// links fall back to `candy-holders.db`
    pub db_path: Option<PathBuf>,
}

impl PacingConfig {
    pub fn retry_policy(&self, backoff_override: Option<u64>) -> RetryPolicy {
        let ms = backoff_override.unwrap_or(self.retry_backoff_ms);
        RetryPolicy::with_min_backoff(Duration::from_millis(ms))
    }

    pub fn chill(&self, override_ms: Option<u64>) -> Duration {
        Duration::from_millis(override_ms.unwrap_or(self.chill_ms))
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./candymine.toml (current directory)
    /// 2. ~/.config/candymine/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("candymine.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "candymine") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.rpc.url, "https://api.mainnet-beta.solana.com");
        assert_eq!(config.bundler.url, "https://node2.bundlr.network");
        assert_eq!(config.bundler.gateway, "https://arweave.net");
        assert_eq!(config.pacing.chill_ms, 100);
        assert_eq!(config.pacing.retry_backoff_ms, 1000);
        assert!(config.store.db_path.is_none());
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[rpc]
url = "https://rpc.example.org"

[pacing]
chill_ms = 250

[store]
db_path = "/var/lib/candy.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.rpc.url, "https://rpc.example.org");
        assert_eq!(config.pacing.chill_ms, 250);
        assert_eq!(config.pacing.retry_backoff_ms, 1000);
        assert_eq!(config.bundler.gateway, "https://arweave.net");
        assert_eq!(config.store.db_path, Some(PathBuf::from("/var/lib/candy.db")));
    }

    #[test]
    fn flags_override_file_values() {
        let pacing = PacingConfig {
            chill_ms: 250,
            retry_backoff_ms: 500,
        };
        assert_eq!(pacing.chill(None), Duration::from_millis(250));
        assert_eq!(pacing.chill(Some(0)), Duration::ZERO);
        assert_eq!(pacing.retry_policy(None).backoff(1), Duration::from_millis(500));
        assert_eq!(pacing.retry_policy(Some(10)).backoff(2), Duration::from_millis(20));
    }

    #[test]
    fn unknown_section_is_ignored_bad_value_is_not() {
        assert!(toml::from_str::<Config>("[extra]\nx = 1\n").is_ok());
        assert!(toml::from_str::<Config>("[pacing]\nchill_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::from_file(Path::new("/nonexistent/candymine.toml")).is_err());
    }
}
