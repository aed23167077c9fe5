//! A period-bounded value quota shared by every message operation.

use alloy_primitives::U256;
use canal_primitives::{AccessError, BridgeEvent, CallContext, RateLimitState, Role};
use canal_storage::{EventStorage, RateLimitStorage};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by the [`RateLimiter`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The configured period is zero.
    #[error("rate limit period is zero")]
    PeriodIsZero,
    /// The configured limit is zero.
    #[error("rate limit is zero")]
    LimitIsZero,
    /// Consuming the amount would exceed the limit of the current period.
    #[error("rate limit exceeded: {used} used, {requested} requested, limit {limit}")]
    RateLimitExceeded {
        /// The amount already used in the period.
        used: U256,
        /// The amount requested.
        requested: U256,
        /// The limit of the period.
        limit: U256,
    },
    /// The caller lacks the rate-limit setter role.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// The rate limiter over a store.
///
/// The limiter itself is stateless: it borrows the store for the duration of one operation and
/// reads and writes the singleton [`RateLimitState`] through it.
#[derive(Debug)]
pub struct RateLimiter<'s, S> {
    store: &'s mut S,
}

impl<'s, S> RateLimiter<'s, S>
where
    S: RateLimitStorage + EventStorage,
{
    /// Creates a limiter over `store`.
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Installs a fresh quota of `limit` per `period_seconds`, with the first period starting at
    /// `now`.
    pub fn initialize(
        &mut self,
        period_seconds: u64,
        limit: U256,
        now: u64,
    ) -> Result<(), RateLimitError> {
        if period_seconds == 0 {
            return Err(RateLimitError::PeriodIsZero);
        }
        if limit.is_zero() {
            return Err(RateLimitError::LimitIsZero);
        }

        self.store.set_rate_limit(RateLimitState {
            period_seconds,
            limit,
            used_in_period: U256::ZERO,
            period_end: now.saturating_add(period_seconds),
        });
        Ok(())
    }

    /// Consumes `amount` of the current period's quota.
    ///
    /// A period that ended before `now` is rolled over first. On failure the state is left
    /// untouched.
    pub fn consume(&mut self, amount: U256, now: u64) -> Result<(), RateLimitError> {
        let mut state = self.store.rate_limit();
        if now > state.period_end {
            state.used_in_period = U256::ZERO;
            state.period_end = now.saturating_add(state.period_seconds);
        }

        let used = state
            .used_in_period
            .checked_add(amount)
            .filter(|used| *used <= state.limit)
            .ok_or_else(|| {
                warn!(
                    target: "rate_limit",
                    used = %state.used_in_period,
                    requested = %amount,
                    limit = %state.limit,
                    "Rate limit exceeded"
                );
                RateLimitError::RateLimitExceeded {
                    used: state.used_in_period,
                    requested: amount,
                    limit: state.limit,
                }
            })?;

        state.used_in_period = used;
        self.store.set_rate_limit(state);
        Ok(())
    }

    /// Resets the amount used in the current period.
    pub fn reset_used(&mut self, ctx: &CallContext) -> Result<(), RateLimitError> {
        ctx.require_role(Role::RateLimitSetter)?;

        let mut state = self.store.rate_limit();
        state.used_in_period = U256::ZERO;
        self.store.set_rate_limit(state);
        self.store.emit(BridgeEvent::AmountUsedInPeriodReset { caller: ctx.caller });

        debug!(target: "rate_limit", caller = %ctx.caller, "Reset used amount");
        Ok(())
    }

    /// Changes the limit.
    ///
    /// If the current period has already ended, it is rolled over and the used amount reset.
    /// Otherwise the used amount is kept, even when it now exceeds the new limit.
    pub fn set_limit(&mut self, ctx: &CallContext, limit: U256) -> Result<(), RateLimitError> {
        ctx.require_role(Role::RateLimitSetter)?;
        if limit.is_zero() {
            return Err(RateLimitError::LimitIsZero);
        }

        let mut state = self.store.rate_limit();
        let used_amount_reset_to_zero = ctx.timestamp > state.period_end;
        if used_amount_reset_to_zero {
            state.used_in_period = U256::ZERO;
            state.period_end = ctx.timestamp.saturating_add(state.period_seconds);
        }
        state.limit = limit;
        self.store.set_rate_limit(state);
        self.store.emit(BridgeEvent::LimitAmountChanged {
            caller: ctx.caller,
            limit,
            used_amount_reset_to_zero,
        });

        debug!(target: "rate_limit", %limit, used_amount_reset_to_zero, "Changed rate limit");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use canal_storage::MemoryDb;
    use proptest::prelude::*;

    const PERIOD: u64 = 86_400;

    fn limited(limit: u64, now: u64) -> MemoryDb {
        let mut db = MemoryDb::new();
        RateLimiter::new(&mut db).initialize(PERIOD, U256::from(limit), now).unwrap();
        db
    }

    fn setter(timestamp: u64) -> CallContext {
        CallContext::new(Address::repeat_byte(0x01), timestamp).with_role(Role::RateLimitSetter)
    }

    #[test]
    fn test_initialize_rejects_zero() {
        let mut db = MemoryDb::new();
        let mut limiter = RateLimiter::new(&mut db);
        assert_eq!(limiter.initialize(0, U256::from(1), 0), Err(RateLimitError::PeriodIsZero));
        assert_eq!(limiter.initialize(PERIOD, U256::ZERO, 0), Err(RateLimitError::LimitIsZero));
    }

    #[test]
    fn test_consume_up_to_limit() {
        let mut db = limited(100, 0);
        let mut limiter = RateLimiter::new(&mut db);

        limiter.consume(U256::from(60), 10).unwrap();
        limiter.consume(U256::from(40), 20).unwrap();
        assert_eq!(
            limiter.consume(U256::from(1), 30),
            Err(RateLimitError::RateLimitExceeded {
                used: U256::from(100),
                requested: U256::from(1),
                limit: U256::from(100),
            })
        );
        assert_eq!(db.rate_limit().used_in_period, U256::from(100));
    }

    #[test]
    fn test_failed_consume_leaves_state() {
        let mut db = limited(100, 0);
        let before = db.rate_limit();
        assert!(RateLimiter::new(&mut db).consume(U256::from(101), 5).is_err());
        assert_eq!(db.rate_limit(), before);
    }

    #[test]
    fn test_consume_rolls_period() {
        let mut db = limited(100, 0);
        let mut limiter = RateLimiter::new(&mut db);

        limiter.consume(U256::from(100), 1).unwrap();
        // The period end itself still belongs to the period.
        assert!(limiter.consume(U256::from(1), PERIOD).is_err());
        limiter.consume(U256::from(100), PERIOD + 1).unwrap();

        let state = db.rate_limit();
        assert_eq!(state.used_in_period, U256::from(100));
        assert_eq!(state.period_end, 2 * PERIOD + 1);
    }

    #[test]
    fn test_consume_overflow_is_exceeded() {
        let mut db = limited(100, 0);
        let err = RateLimiter::new(&mut db).consume(U256::MAX, 1).unwrap_err();
        assert!(matches!(err, RateLimitError::RateLimitExceeded { .. }));
    }

    #[test]
    fn test_set_limit_keeps_used_within_period() {
        let mut db = limited(100, 0);
        let mut limiter = RateLimiter::new(&mut db);
        limiter.consume(U256::from(80), 1).unwrap();
        limiter.set_limit(&setter(2), U256::from(50)).unwrap();

        let state = db.rate_limit();
        assert_eq!(state.limit, U256::from(50));
        assert_eq!(state.used_in_period, U256::from(80));
        assert_eq!(
            db.events().last(),
            Some(&BridgeEvent::LimitAmountChanged {
                caller: Address::repeat_byte(0x01),
                limit: U256::from(50),
                used_amount_reset_to_zero: false,
            })
        );

        // Nothing more fits until the period rolls over.
        assert!(RateLimiter::new(&mut db).consume(U256::from(1), 3).is_err());
    }

    #[test]
    fn test_set_limit_after_period_resets_used() {
        let mut db = limited(100, 0);
        RateLimiter::new(&mut db).consume(U256::from(80), 1).unwrap();
        RateLimiter::new(&mut db).set_limit(&setter(PERIOD + 5), U256::from(200)).unwrap();

        let state = db.rate_limit();
        assert_eq!(state.used_in_period, U256::ZERO);
        assert_eq!(state.period_end, 2 * PERIOD + 5);
        assert!(matches!(
            db.events().last(),
            Some(BridgeEvent::LimitAmountChanged { used_amount_reset_to_zero: true, .. })
        ));
    }

    #[test]
    fn test_privileged_operations_require_role() {
        let mut db = limited(100, 0);
        let ctx = CallContext::new(Address::repeat_byte(0x02), 1);
        let mut limiter = RateLimiter::new(&mut db);

        assert!(matches!(
            limiter.reset_used(&ctx),
            Err(RateLimitError::Access(AccessError::Unauthorized { .. }))
        ));
        assert!(matches!(
            limiter.set_limit(&ctx, U256::from(5)),
            Err(RateLimitError::Access(AccessError::Unauthorized { .. }))
        ));
    }

    #[test]
    fn test_reset_used() {
        let mut db = limited(100, 0);
        RateLimiter::new(&mut db).consume(U256::from(100), 1).unwrap();
        RateLimiter::new(&mut db).reset_used(&setter(2)).unwrap();

        assert_eq!(db.rate_limit().used_in_period, U256::ZERO);
        assert_eq!(
            db.events().last(),
            Some(&BridgeEvent::AmountUsedInPeriodReset { caller: Address::repeat_byte(0x01) })
        );
        RateLimiter::new(&mut db).consume(U256::from(100), 3).unwrap();
    }

    proptest! {
        #[test]
        fn test_consumed_within_period_never_exceeds_limit(
            limit in 1u64..1_000,
            amounts in proptest::collection::vec(0u64..400, 1..32),
        ) {
            let mut db = limited(limit, 0);
            let mut accepted = 0u64;
            for (i, amount) in amounts.into_iter().enumerate() {
                if RateLimiter::new(&mut db).consume(U256::from(amount), i as u64 + 1).is_ok() {
                    accepted += amount;
                }
            }
            prop_assert!(accepted <= limit);
            prop_assert_eq!(db.rate_limit().used_in_period, U256::from(accepted));
        }
    }
}
