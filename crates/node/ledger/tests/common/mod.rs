//! Shared fixtures for the ledger integration tests.

#![allow(dead_code, unreachable_pub)]

use alloy_primitives::{Address, B256, U256, address, b256};
use canal_ledger::{FeePolicyConfig, GenesisConfig, Ledger, LedgerConfig, RateLimitConfig};
use canal_messaging::test_utils::MockExecutor;
use canal_primitives::{CallContext, Role};
use canal_storage::MemoryDb;

pub const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
pub const POSTMAN: Address = address!("0x0000000000000000000000000000000000005057");
pub const ADMIN: Address = address!("0x00000000000000000000000000000000000ad111");

pub const GENESIS_ROOT: B256 =
    b256!("0x072ead6777750dc20232d1cee8dc9a395c2d350df4bbaa5096c6f59b214dcecd");
pub const GENESIS_TIMESTAMP: u64 = 1_000;
pub const PERIOD: u64 = 86_400;
pub const LIMIT: u64 = 1_000;

pub type TestLedger = Ledger<MemoryDb, MockExecutor>;

pub fn config() -> LedgerConfig {
    LedgerConfig {
        genesis: GenesisConfig {
            initial_state_root: GENESIS_ROOT,
            initial_block: 0,
            initial_timestamp: GENESIS_TIMESTAMP,
        },
        rate_limit: RateLimitConfig { period_seconds: PERIOD, limit: U256::from(LIMIT) },
        rolling_hash_activation_number: 1,
        minimum_fee: U256::ZERO,
        fee_policy: FeePolicyConfig::default(),
    }
}

pub fn ledger() -> TestLedger {
    Ledger::in_memory(&config(), MockExecutor::new()).unwrap()
}

/// An account holding every role, at `timestamp`.
pub fn admin(timestamp: u64) -> CallContext {
    [
        Role::DefaultAdmin,
        Role::RateLimitSetter,
        Role::MessageHashSetter,
        Role::PauseManager,
        Role::Operator,
        Role::VerifierSetter,
        Role::MinimumFeeSetter,
    ]
    .into_iter()
    .fold(CallContext::new(ADMIN, timestamp), CallContext::with_role)
}
