//! Replay Subcommand

use crate::{
    flags::GlobalArgs,
    runtime::SimulatedExecutor,
    scenario::{Scenario, Step},
};
use anyhow::{Context, bail};
use canal_ledger::{Ledger, LedgerConfig};
use canal_primitives::{BridgeEvent, FinalizedState};
use canal_storage::MemoryDb;
use clap::Parser;
use serde::Serialize;
use std::{io::Write, path::PathBuf};
use tracing::{info, warn};

/// The `replay` Subcommand
///
/// Replays every step of a scenario against a ledger seeded from the configuration and prints
/// one JSON line per step, followed by a summary line.
#[derive(Parser, Default, PartialEq, Eq, Debug, Clone)]
#[command(about = "Replays a scenario of operations against a fresh ledger")]
pub struct ReplayCommand {
    /// Path to the JSON scenario.
    #[arg(long, short = 's', env = "CANAL_SCENARIO")]
    pub scenario: PathBuf,
    /// Stop at the first failing step and exit with an error.
    #[arg(long)]
    pub fail_fast: bool,
}

/// The outcome of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// The position of the step in the scenario.
    pub step: usize,
    /// The operation of the step.
    pub operation: &'static str,
    /// The error the step failed with, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The notifications emitted by the step.
    pub events: Vec<BridgeEvent>,
}

/// The state of the ledger after a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The number of replayed steps.
    pub steps: usize,
    /// The number of failed steps.
    pub failed: usize,
    /// The finalized head.
    pub finalized: FinalizedState,
    /// The number the next sent message will be assigned.
    pub next_message_number: u64,
}

impl ReplayCommand {
    /// Runs the subcommand.
    pub fn run(self, args: &GlobalArgs, out: &mut impl Write) -> anyhow::Result<()> {
        let config = args.load_config()?;
        let contents = std::fs::read_to_string(&self.scenario)
            .with_context(|| format!("failed to read scenario {}", self.scenario.display()))?;
        let scenario: Scenario = serde_json::from_str(&contents)
            .with_context(|| format!("invalid scenario {}", self.scenario.display()))?;

        let summary = replay(&config, &scenario, self.fail_fast, out)?;
        info!(
            target: "canal",
            steps = summary.steps,
            failed = summary.failed,
            finalized_block = summary.finalized.last_finalized_block,
            "Replay complete"
        );
        Ok(())
    }
}

/// Replays `scenario` against a fresh in-memory ledger seeded from `config`, writing one JSON
/// line per step and a final summary line to `out`.
pub fn replay(
    config: &LedgerConfig,
    scenario: &Scenario,
    fail_fast: bool,
    out: &mut impl Write,
) -> anyhow::Result<Summary> {
    let executor = SimulatedExecutor::new();
    for &account in &scenario.rejecting_accounts {
        executor.set_rejecting(account);
    }
    let ledger: Ledger<MemoryDb, _> = Ledger::in_memory(config, executor)?;

    let mut failed = 0;
    for (index, Step { context, operation }) in scenario.steps.iter().enumerate() {
        let result = operation.apply(&ledger, context);
        let report = StepReport {
            step: index,
            operation: operation.name(),
            error: result.as_ref().err().map(ToString::to_string),
            events: ledger.drain_events(),
        };
        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out)?;

        if let Err(err) = result {
            failed += 1;
            warn!(target: "canal", step = index, operation = operation.name(), %err, "Step failed");
            if fail_fast {
                bail!("step {index} ({}) failed: {err}", operation.name());
            }
        }
    }

    let summary = Summary {
        steps: scenario.steps.len(),
        failed,
        finalized: ledger.finalized_state(),
        next_message_number: ledger.next_message_number(),
    };
    serde_json::to_writer(&mut *out, &summary)?;
    writeln!(out)?;
    Ok(summary)
}
