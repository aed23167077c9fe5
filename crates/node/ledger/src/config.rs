//! Ledger configuration.

use alloy_primitives::{B256, U256};
use canal_messaging::FeePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a [`LedgerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not a valid configuration.
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

/// The configuration a ledger is seeded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// The finalized state the ledger starts from.
    pub genesis: GenesisConfig,
    /// The value quota shared by message operations.
    pub rate_limit: RateLimitConfig,
    /// The first message number chained into the outbound rolling hash.
    #[serde(default = "default_rolling_hash_activation_number")]
    pub rolling_hash_activation_number: u64,
    /// The minimum fee a sent message must carry.
    #[serde(default)]
    pub minimum_fee: U256,
    /// How claim fees are distributed.
    #[serde(default)]
    pub fee_policy: FeePolicyConfig,
}

const fn default_rolling_hash_activation_number() -> u64 {
    1
}

/// The genesis finalized state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisConfig {
    /// The state root at the initial block.
    pub initial_state_root: B256,
    /// The initial finalized block.
    #[serde(default)]
    pub initial_block: u64,
    /// The timestamp of the initial block.
    #[serde(default)]
    pub initial_timestamp: u64,
}

/// The rate limit installed at genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// The length of a period in seconds.
    pub period_seconds: u64,
    /// The value that may move per period.
    pub limit: U256,
}

/// The claim fee policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeePolicyConfig {
    /// Whether fees of messages without call data are partly refunded.
    pub refund_enabled: bool,
    /// The part of a refunded fee kept by the fee receiver.
    pub delivery_cost: U256,
}

impl From<FeePolicyConfig> for FeePolicy {
    fn from(config: FeePolicyConfig) -> Self {
        Self { refund_enabled: config.refund_enabled, delivery_cost: config.delivery_cost }
    }
}

impl LedgerConfig {
    /// Parses a configuration from TOML.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Reads and parses the TOML configuration at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use std::io::Write;

    const CONFIG: &str = r#"
        rollingHashActivationNumber = 3
        minimumFee = "0x64"

        [genesis]
        initialStateRoot = "0x072ead6777750dc20232d1cee8dc9a395c2d350df4bbaa5096c6f59b214dcecd"
        initialBlock = 0
        initialTimestamp = 1683325137

        [rateLimit]
        periodSeconds = 86400
        limit = "1000000000000000000000"

        [feePolicy]
        refundEnabled = true
        deliveryCost = "0x10"
    "#;

    #[test]
    fn test_parse_config() {
        let config = LedgerConfig::from_toml(CONFIG).unwrap();
        assert_eq!(
            config.genesis.initial_state_root,
            b256!("0x072ead6777750dc20232d1cee8dc9a395c2d350df4bbaa5096c6f59b214dcecd")
        );
        assert_eq!(config.genesis.initial_timestamp, 1_683_325_137);
        assert_eq!(config.rate_limit.limit, U256::from(10).pow(U256::from(21)));
        assert_eq!(config.rolling_hash_activation_number, 3);
        assert_eq!(config.minimum_fee, U256::from(100));
        assert_eq!(
            FeePolicy::from(config.fee_policy),
            FeePolicy { refund_enabled: true, delivery_cost: U256::from(16) }
        );
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::from_toml(
            r#"
            [genesis]
            initialStateRoot = "0x0000000000000000000000000000000000000000000000000000000000000001"
            [rateLimit]
            periodSeconds = 60
            limit = "5"
            "#,
        )
        .unwrap();
        assert_eq!(config.rolling_hash_activation_number, 1);
        assert_eq!(config.minimum_fee, U256::ZERO);
        assert_eq!(config.fee_policy, FeePolicyConfig::default());
        assert_eq!(config.genesis.initial_block, 0);
    }

    #[test]
    fn test_missing_section_is_rejected() {
        assert!(matches!(LedgerConfig::from_toml("minimumFee = \"1\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        assert_eq!(LedgerConfig::from_file(file.path()).unwrap(), LedgerConfig::from_toml(CONFIG).unwrap());

        assert!(matches!(
            LedgerConfig::from_file("/nonexistent/canal.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
