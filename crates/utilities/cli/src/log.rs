//! Verbosity flags and tracing subscriber setup.

use crate::{CliError, CliResult};
use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Logging arguments shared by every canal binary.
#[derive(Parser, Default, Clone, Debug, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level (0-4). Each `-v` raises the level: error, warn, info, debug, trace.
    #[arg(long, short, action = ArgAction::Count, global = true)]
    pub v: u8,
}

impl LogArgs {
    /// Returns the most verbose level enabled by the flags.
    pub const fn level(&self) -> Level {
        match self.v {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Installs the global `fmt` subscriber, writing to stderr.
///
/// Without an explicit `env_filter`, directives are read from `RUST_LOG` with the level of
/// `verbosity` as the default.
pub fn init_tracing_subscriber(verbosity: u8, env_filter: Option<EnvFilter>) -> CliResult<()> {
    let level = LogArgs { v: verbosity }.level();
    let filter = env_filter.unwrap_or_else(|| {
        EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(CliError::Tracing)
}
