#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod config;
pub use config::{ConfigError, FeePolicyConfig, GenesisConfig, LedgerConfig, RateLimitConfig};

mod error;
pub use error::LedgerError;

mod pause;
pub use pause::PauseManager;

mod ledger;
pub use ledger::Ledger;

#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub(crate) use metrics::Metrics;
