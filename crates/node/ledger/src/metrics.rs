use crate::LedgerError;

#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const LEDGER_CALLS_TOTAL: &'static str = "canal_ledger_calls_total";
    pub(crate) const LEDGER_RATE_LIMIT_REJECTIONS_TOTAL: &'static str =
        "canal_ledger_rate_limit_rejections_total";
    pub(crate) const LEDGER_LAST_FINALIZED_BLOCK: &'static str = "canal_ledger_last_finalized_block";

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::LEDGER_CALLS_TOTAL,
            metrics::Unit::Count,
            "Total number of ledger entry point calls, by operation and outcome",
        );

        metrics::describe_counter!(
            Self::LEDGER_RATE_LIMIT_REJECTIONS_TOTAL,
            metrics::Unit::Count,
            "Total number of operations rejected by the rate limiter",
        );

        metrics::describe_gauge!(
            Self::LEDGER_LAST_FINALIZED_BLOCK,
            metrics::Unit::Count,
            "The last finalized block of the ledger",
        );
    }

    fn zero() {
        metrics::counter!(Self::LEDGER_RATE_LIMIT_REJECTIONS_TOTAL).increment(0);

        metrics::gauge!(Self::LEDGER_LAST_FINALIZED_BLOCK).set(0.0);
    }

    pub(crate) fn record_call<T>(operation: &'static str, result: &Result<T, LedgerError>) {
        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            Self::LEDGER_CALLS_TOTAL,
            "operation" => operation,
            "outcome" => outcome,
        )
        .increment(1);

        if result.as_ref().is_err_and(LedgerError::is_rate_limited) {
            metrics::counter!(Self::LEDGER_RATE_LIMIT_REJECTIONS_TOTAL).increment(1);
        }
    }

    pub(crate) fn record_finalized_block(block: u64) {
        metrics::gauge!(Self::LEDGER_LAST_FINALIZED_BLOCK).set(block as f64);
    }
}
