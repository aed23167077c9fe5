//! Roles, pause types and the per-call capability context.

use alloy_primitives::{Address, U256};
use std::collections::BTreeSet;
use thiserror::Error;

/// A named capability an account may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Role {
    /// The administrator. Allowed to finalize without a proof.
    #[display("default-admin")]
    DefaultAdmin,
    /// Allowed to change the rate limit and reset the used amount.
    #[display("rate-limit-setter")]
    RateLimitSetter,
    /// Allowed to insert inbound message hashes.
    #[display("message-hash-setter")]
    MessageHashSetter,
    /// Allowed to pause and unpause.
    #[display("pause-manager")]
    PauseManager,
    /// Allowed to submit data and finalize with a proof.
    #[display("operator")]
    Operator,
    /// Allowed to set and unset proof verifiers.
    #[display("verifier-setter")]
    VerifierSetter,
    /// Allowed to change the minimum message fee.
    #[display("minimum-fee-setter")]
    MinimumFeeSetter,
}

/// The independently toggleable pause flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PauseType {
    /// Blocks every pausable operation.
    #[display("general")]
    General,
    /// Blocks sending messages.
    #[display("outbound")]
    Outbound,
    /// Blocks claiming messages.
    #[display("inbound")]
    Inbound,
    /// Blocks proof-gated finalization.
    #[display("proving-system")]
    ProvingSystem,
}

impl PauseType {
    /// All pause types.
    pub const ALL: [Self; 4] = [Self::General, Self::Outbound, Self::Inbound, Self::ProvingSystem];
}

/// Errors raised by capability checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The caller does not hold the required role.
    #[error("account {account} is missing role {role}")]
    Unauthorized {
        /// The caller.
        account: Address,
        /// The role that was required.
        role: Role,
    },
    /// The operation is blocked by a pause flag.
    #[error("{0} is paused")]
    IsPaused(PauseType),
    /// The pause flag was expected to be set.
    #[error("{0} is not paused")]
    IsNotPaused(PauseType),
}

/// The capability context of a single call.
///
/// Everything an operation needs to know about "who, with how much, and when" is resolved once
/// per call and passed in explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct CallContext {
    /// The account making the call.
    pub caller: Address,
    /// The value attached to the call.
    pub value: U256,
    /// The clock at call time, in seconds.
    pub timestamp: u64,
    /// The roles held by the caller.
    pub roles: BTreeSet<Role>,
}

impl CallContext {
    /// Creates a context for `caller` at `timestamp`, with no value and no roles.
    pub const fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, value: U256::ZERO, timestamp, roles: BTreeSet::new() }
    }

    /// Attaches `value` to the call.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Grants `role` to the caller for this call.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Returns whether the caller holds `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Fails with [`AccessError::Unauthorized`] unless the caller holds `role`.
    pub fn require_role(&self, role: Role) -> Result<(), AccessError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized { account: self.caller, role })
        }
    }
}
