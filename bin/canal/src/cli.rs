//! Contains the canal CLI.

use crate::{
    commands::{Commands, ConfigCommand, ReplayCommand},
    flags::GlobalArgs,
};
use anyhow::Result;
use canal_cli::{cli_styles, init_tracing_subscriber};
use clap::Parser;

/// The canal CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub struct Cli {
    /// Global arguments for the CLI.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub subcommand: Commands,
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        init_tracing_subscriber(self.global.log_args.v, None)?;

        #[cfg(feature = "metrics")]
        let recorder = if self.global.metrics {
            Some(canal_cli::install_prometheus_recorder()?)
        } else {
            None
        };
        #[cfg(not(feature = "metrics"))]
        if self.global.metrics {
            tracing::warn!(target: "canal", "Built without the metrics feature, ignoring --metrics");
        }

        let mut stdout = std::io::stdout().lock();
        match self.subcommand {
            Commands::Replay(cmd) => cmd.run(&self.global, &mut stdout)?,
            Commands::Config(cmd) => cmd.run(&self.global, &mut stdout)?,
        }

        #[cfg(feature = "metrics")]
        if let Some(recorder) = recorder {
            use std::io::Write;
            writeln!(stdout, "{}", recorder.render())?;
        }
        Ok(())
    }
}
