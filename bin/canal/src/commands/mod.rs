//! Subcommands for the canal CLI.

use clap::Subcommand;

mod config;
pub use config::ConfigCommand;

mod replay;
pub use replay::{ReplayCommand, StepReport, Summary};

/// The subcommands of the canal CLI.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Replays a scenario of operations against a fresh ledger.
    #[command(alias = "r")]
    Replay(ReplayCommand),
    /// Validates the ledger configuration and prints it as JSON.
    Config(ConfigCommand),
}
