//! Global arguments for the CLI.

use anyhow::Context;
use canal_cli::LogArgs;
use canal_ledger::LedgerConfig;
use clap::Parser;
use std::path::PathBuf;

/// Global arguments for the CLI.
#[derive(Parser, Clone, Debug)]
pub struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub log_args: LogArgs,
    /// Path to the TOML ledger configuration.
    #[arg(long, short = 'c', global = true, env = "CANAL_CONFIG", default_value = "canal.toml")]
    pub config: PathBuf,
    /// Print a Prometheus snapshot of the ledger metrics when the command finishes.
    #[arg(long, global = true, env = "CANAL_METRICS")]
    pub metrics: bool,
}

impl GlobalArgs {
    /// Loads the ledger configuration.
    pub fn load_config(&self) -> anyhow::Result<LedgerConfig> {
        LedgerConfig::from_file(&self.config)
            .with_context(|| format!("invalid ledger configuration {}", self.config.display()))
    }
}
