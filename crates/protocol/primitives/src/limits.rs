//! The rate limiter's persisted state.

use alloy_primitives::U256;

/// The period-bounded value quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RateLimitState {
    /// The length of a period, in seconds.
    pub period_seconds: u64,
    /// The maximum value that may move within one period.
    pub limit: U256,
    /// The value moved so far in the current period.
    pub used_in_period: U256,
    /// The end of the current period.
    pub period_end: u64,
}
