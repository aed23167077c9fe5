//! Config Subcommand

use crate::flags::GlobalArgs;
use clap::Parser;
use std::io::Write;

/// The `config` Subcommand
///
/// Parses the ledger configuration and prints it back as JSON, failing on invalid input.
#[derive(Parser, Default, PartialEq, Eq, Debug, Clone)]
#[command(about = "Validates the ledger configuration")]
pub struct ConfigCommand {}

impl ConfigCommand {
    /// Runs the subcommand.
    pub fn run(self, args: &GlobalArgs, out: &mut impl Write) -> anyhow::Result<()> {
        let config = args.load_config()?;
        serde_json::to_writer_pretty(&mut *out, &config)?;
        writeln!(out)?;
        Ok(())
    }
}
