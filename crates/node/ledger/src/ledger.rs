//! The ledger facade.

use crate::{LedgerConfig, LedgerError, PauseManager};
use alloy_primitives::{Address, B256, Bytes, U256};
use canal_messaging::{
    ClaimProof, Executor, FeePolicy, MessageRegistry, MessageService, RateLimiter,
    is_number_claimed,
};
use canal_primitives::{
    BridgeEvent, CallContext, DataChunk, FinalizationData, FinalizedState, InboxStatus, Message,
    OutboxStatus, PauseType, RateLimitState, Role, SubmissionData,
};
use canal_rollup::{
    DataSubmission, Finalizer, ProofVerifier, RollupError, Verifiers, check_proof,
};
use canal_storage::{
    EventStorage, LedgerStorage, MemoryDb, MessageStorage, PauseStorage, RateLimitStorage,
    RollupStorage, SharedStore, Transactional,
};
use core::cell::RefCell;
use tracing::{debug, info, trace, warn};

/// A two-layer settlement ledger.
///
/// The ledger composes the message bridge and the rollup state machine over one shared store.
/// Every entry point is failure-atomic: on error the store, the emitted events and the
/// executor's balances are left exactly as they were.
#[derive(Debug)]
pub struct Ledger<S, X> {
    store: SharedStore<S>,
    messaging: MessageService<S, X>,
    verifiers: RefCell<Verifiers>,
}

impl<X: Executor> Ledger<MemoryDb, X> {
    /// Creates a ledger over a fresh in-memory store.
    pub fn in_memory(config: &LedgerConfig, executor: X) -> Result<Self, LedgerError> {
        Self::new(config, MemoryDb::new(), executor)
    }
}

impl<S, X> Ledger<S, X>
where
    S: LedgerStorage,
    X: Executor,
{
    /// Creates a ledger over `store`, seeded from `config`, delivering through `executor`.
    pub fn new(config: &LedgerConfig, store: S, executor: X) -> Result<Self, LedgerError> {
        #[cfg(feature = "metrics")]
        crate::Metrics::init();

        let store = SharedStore::new(store);
        store.borrow_mut().atomically(|store| {
            let genesis = config.genesis;
            RateLimiter::new(store).initialize(
                config.rate_limit.period_seconds,
                config.rate_limit.limit,
                genesis.initial_timestamp,
            )?;
            DataSubmission::new(store).initialize(
                genesis.initial_state_root,
                genesis.initial_block,
                genesis.initial_timestamp,
            );
            if store.next_message_number() == 0 {
                store.set_next_message_number(1);
            }
            store.set_minimum_fee(config.minimum_fee);
            Ok::<_, LedgerError>(())
        })?;

        let messaging = MessageService::new(store.clone(), executor)
            .with_fee_policy(FeePolicy::from(config.fee_policy))
            .with_rolling_hash_activation(config.rolling_hash_activation_number);

        info!(
            target: "ledger",
            initial_block = config.genesis.initial_block,
            initial_state_root = %config.genesis.initial_state_root,
            "Initialized ledger"
        );
        Ok(Self { store, messaging, verifiers: RefCell::new(Verifiers::new()) })
    }

    /// Sends a message carrying the call's value, minus `fee`, to `recipient`.
    pub fn send(
        &self,
        ctx: &CallContext,
        recipient: Address,
        fee: U256,
        calldata: Bytes,
    ) -> Result<Message, LedgerError> {
        observe("send", self.messaging.send(ctx, recipient, fee, calldata))
    }

    /// Claims an inbound message made claimable by hash.
    pub fn claim(
        &self,
        ctx: &CallContext,
        message: &Message,
        fee_recipient: Address,
    ) -> Result<B256, LedgerError> {
        observe("claim", self.messaging.claim(ctx, message, fee_recipient))
    }

    /// Claims an inbound message with a Merkle proof against an anchored remote root.
    pub fn claim_with_proof(
        &self,
        ctx: &CallContext,
        claim: &ClaimProof,
    ) -> Result<B256, LedgerError> {
        observe("claim_with_proof", self.messaging.claim_with_proof(ctx, claim))
    }

    /// Makes the inbound message `hash` claimable.
    pub fn mark_deliverable(&self, ctx: &CallContext, hash: B256) -> Result<(), LedgerError> {
        let result = self
            .store
            .borrow_mut()
            .atomically(|store| MessageRegistry::new(store).mark_deliverable(ctx, hash));
        observe("mark_deliverable", result)
    }

    /// Anchors a batch of inbound message hashes, continuing the inbound rolling hash.
    pub fn anchor_message_hashes(
        &self,
        ctx: &CallContext,
        hashes: &[B256],
        start_number: u64,
        final_number: u64,
        final_rolling_hash: B256,
    ) -> Result<(), LedgerError> {
        let result = self.store.borrow_mut().atomically(|store| {
            MessageRegistry::new(store).anchor_message_hashes(
                ctx,
                hashes,
                start_number,
                final_number,
                final_rolling_hash,
            )
        });
        observe("anchor_message_hashes", result)
    }

    /// Records that the remote layer received the outbound messages `hashes`.
    pub fn acknowledge_delivered(
        &self,
        ctx: &CallContext,
        hashes: &[B256],
    ) -> Result<(), LedgerError> {
        let result = self
            .store
            .borrow_mut()
            .atomically(|store| MessageRegistry::new(store).acknowledge_delivered(ctx, hashes));
        observe("acknowledge_delivered", result)
    }

    /// Submits one data chunk.
    pub fn submit(
        &self,
        ctx: &CallContext,
        data: &SubmissionData,
        expected_shnarf: Option<B256>,
    ) -> Result<DataChunk, LedgerError> {
        let result =
            DataSubmission::new(&mut *self.store.borrow_mut()).submit(ctx, data, expected_shnarf);
        observe("submit", result)
    }

    /// Submits `chunks` in order, all or none.
    pub fn submit_batch(
        &self,
        ctx: &CallContext,
        chunks: &[SubmissionData],
        expected_shnarf: Option<B256>,
    ) -> Result<Vec<DataChunk>, LedgerError> {
        let result = DataSubmission::new(&mut *self.store.borrow_mut()).submit_batch(
            ctx,
            chunks,
            expected_shnarf,
        );
        observe("submit_batch", result)
    }

    /// Finalizes the chunks named by `data` without a proof.
    pub fn finalize_without_proof(
        &self,
        ctx: &CallContext,
        data: &FinalizationData,
    ) -> Result<FinalizedState, LedgerError> {
        let result =
            Finalizer::new(&mut *self.store.borrow_mut()).finalize_without_proof(ctx, data);
        observe("finalize_without_proof", result).inspect(|_state| {
            #[cfg(feature = "metrics")]
            crate::Metrics::record_finalized_block(_state.last_finalized_block);
        })
    }

    /// Finalizes the chunks named by `data`, gated by `proof` checked by the verifier installed
    /// at `verifier_index`.
    ///
    /// No borrow of the store or of the verifier set is held while the verifier runs.
    pub fn finalize_with_proof(
        &self,
        ctx: &CallContext,
        proof: &[u8],
        verifier_index: u8,
        data: &FinalizationData,
    ) -> Result<FinalizedState, LedgerError> {
        let result = self.atomically(|| {
            let pending =
                Finalizer::new(&mut *self.store.borrow_mut()).begin_with_proof(ctx, proof, data)?;
            let verifier = self.verifiers.borrow().get(verifier_index)?;
            check_proof(&*verifier, proof, pending.public_input)?;
            Ok(Finalizer::new(&mut *self.store.borrow_mut()).complete_with_proof(&pending))
        })
        .inspect_err(|err| warn!(target: "ledger", %err, "Proof finalization rejected"));
        observe("finalize_with_proof", result).inspect(|_state| {
            #[cfg(feature = "metrics")]
            crate::Metrics::record_finalized_block(_state.last_finalized_block);
        })
    }

    /// Installs `verifier` for proof type `index`, replacing any previous one.
    pub fn set_verifier(
        &self,
        ctx: &CallContext,
        index: u8,
        verifier: Box<dyn ProofVerifier>,
    ) -> Result<(), LedgerError> {
        let result = ctx.require_role(Role::VerifierSetter).map(|()| {
            self.verifiers.borrow_mut().set(index, verifier);
            self.store.borrow_mut().emit(BridgeEvent::VerifierChanged {
                caller: ctx.caller,
                index,
                installed: true,
            });
            debug!(target: "ledger", index, "Installed verifier");
        });
        observe("set_verifier", result)
    }

    /// Removes the verifier for proof type `index`.
    ///
    /// Removing an empty slot succeeds and still emits a notification.
    pub fn unset_verifier(&self, ctx: &CallContext, index: u8) -> Result<(), LedgerError> {
        let result = ctx.require_role(Role::VerifierSetter).map(|()| {
            let removed = self.verifiers.borrow_mut().unset(index);
            self.store.borrow_mut().emit(BridgeEvent::VerifierChanged {
                caller: ctx.caller,
                index,
                installed: false,
            });
            debug!(target: "ledger", index, removed, "Removed verifier");
        });
        observe("unset_verifier", result)
    }

    /// Sets the pause flag `pause_type`.
    pub fn pause(&self, ctx: &CallContext, pause_type: PauseType) -> Result<(), LedgerError> {
        let result = PauseManager::new(&mut *self.store.borrow_mut()).pause(ctx, pause_type);
        observe("pause", result)
    }

    /// Clears the pause flag `pause_type`.
    pub fn unpause(&self, ctx: &CallContext, pause_type: PauseType) -> Result<(), LedgerError> {
        let result = PauseManager::new(&mut *self.store.borrow_mut()).unpause(ctx, pause_type);
        observe("unpause", result)
    }

    /// Changes the rate limit.
    pub fn set_rate_limit(&self, ctx: &CallContext, limit: U256) -> Result<(), LedgerError> {
        let result = RateLimiter::new(&mut *self.store.borrow_mut()).set_limit(ctx, limit);
        observe("set_rate_limit", result)
    }

    /// Resets the amount used in the current rate limit period.
    pub fn reset_rate_limit_used(&self, ctx: &CallContext) -> Result<(), LedgerError> {
        let result = RateLimiter::new(&mut *self.store.borrow_mut()).reset_used(ctx);
        observe("reset_rate_limit_used", result)
    }

    /// Changes the minimum fee a sent message must carry.
    pub fn set_minimum_fee(&self, ctx: &CallContext, fee: U256) -> Result<(), LedgerError> {
        observe("set_minimum_fee", self.messaging.set_minimum_fee(ctx, fee))
    }

    /// Runs `f` inside a store checkpoint, reverting all of its writes if it fails.
    ///
    /// Unlike [`Transactional::atomically`], the store is not borrowed while `f` runs.
    fn atomically<T>(
        &self,
        f: impl FnOnce() -> Result<T, RollupError>,
    ) -> Result<T, RollupError> {
        let checkpoint = self.store.borrow_mut().checkpoint();
        let result = f();
        let mut store = self.store.borrow_mut();
        if result.is_ok() {
            store.commit(checkpoint);
        } else {
            store.revert(checkpoint);
        }
        result
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &X {
        self.messaging.executor()
    }

    /// Returns the number the next sent message will be assigned.
    pub fn next_message_number(&self) -> u64 {
        self.store.borrow().next_message_number()
    }

    /// Returns the outbox status of `hash`.
    pub fn outbox_status(&self, hash: B256) -> OutboxStatus {
        self.store.borrow().outbox_status(hash)
    }

    /// Returns the inbox status of `hash`.
    pub fn inbox_status(&self, hash: B256) -> InboxStatus {
        self.store.borrow().inbox_status(hash)
    }

    /// Returns the outbound rolling hash at message `number`, if any.
    pub fn rolling_hash(&self, number: u64) -> Option<B256> {
        self.store.borrow().rolling_hash(number)
    }

    /// Returns the number of the last anchored inbound message.
    pub fn last_inbound_message_number(&self) -> u64 {
        self.store.borrow().last_inbound_message_number()
    }

    /// Returns the inbound rolling hash at message `number`, if any.
    pub fn inbound_rolling_hash(&self, number: u64) -> Option<B256> {
        self.store.borrow().inbound_rolling_hash(number)
    }

    /// Returns whether the inbound message `number` was claimed with a proof.
    pub fn is_message_claimed(&self, number: u64) -> bool {
        is_number_claimed(&*self.store.borrow(), number)
    }

    /// Returns the depth of the anchored remote tree `root`, if anchored.
    pub fn merkle_root_depth(&self, root: B256) -> Option<u64> {
        self.store.borrow().merkle_root_depth(root)
    }

    /// Returns the minimum fee a sent message must carry.
    pub fn minimum_fee(&self) -> U256 {
        self.store.borrow().minimum_fee()
    }

    /// Returns the rate limiter state.
    pub fn rate_limit(&self) -> RateLimitState {
        self.store.borrow().rate_limit()
    }

    /// Returns whether `pause_type` is set.
    pub fn is_paused(&self, pause_type: PauseType) -> bool {
        self.store.borrow().is_paused(pause_type)
    }

    /// Returns the chunk submitted under `data_hash`, if any.
    pub fn chunk(&self, data_hash: B256) -> Option<DataChunk> {
        self.store.borrow().chunk(data_hash)
    }

    /// Returns the finalized head.
    pub fn finalized_state(&self) -> FinalizedState {
        self.store.borrow().finalized_state()
    }

    /// Returns the finalized state root of `block`, if `block` was a finalization point.
    pub fn state_root(&self, block: u64) -> Option<B256> {
        self.store.borrow().state_root(block)
    }

    /// Returns whether a verifier is installed for proof type `index`.
    pub fn has_verifier(&self, index: u8) -> bool {
        self.verifiers.borrow().contains(index)
    }

    /// Returns the events emitted so far.
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.store.borrow().events().to_vec()
    }

    /// Removes and returns all events emitted so far.
    pub fn drain_events(&self) -> Vec<BridgeEvent> {
        self.store.borrow_mut().drain_events()
    }
}

fn observe<T, E: Into<LedgerError>>(
    operation: &'static str,
    result: Result<T, E>,
) -> Result<T, LedgerError> {
    let result = result.map_err(Into::into);
    match &result {
        Ok(_) => trace!(target: "ledger", operation, "Call succeeded"),
        Err(err) => debug!(target: "ledger", operation, %err, "Call failed"),
    }

    #[cfg(feature = "metrics")]
    crate::Metrics::record_call(operation, &result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FeePolicyConfig, GenesisConfig, RateLimitConfig};
    use alloy_primitives::{address, b256};
    use canal_messaging::test_utils::MockExecutor;
    use canal_primitives::AccessError;
    use canal_rollup::{RollupError, test_utils::MockVerifier};

    const ADMIN: Address = address!("0x00000000000000000000000000000000000ad111");
    const ROOT: B256 = b256!("0x072ead6777750dc20232d1cee8dc9a395c2d350df4bbaa5096c6f59b214dcecd");

    fn config() -> LedgerConfig {
        LedgerConfig {
            genesis: GenesisConfig { initial_state_root: ROOT, initial_block: 0, initial_timestamp: 100 },
            rate_limit: RateLimitConfig { period_seconds: 86_400, limit: U256::from(1_000) },
            rolling_hash_activation_number: 1,
            minimum_fee: U256::from(2),
            fee_policy: FeePolicyConfig::default(),
        }
    }

    fn admin() -> CallContext {
        CallContext::new(ADMIN, 200)
            .with_role(Role::VerifierSetter)
            .with_role(Role::PauseManager)
    }

    #[test]
    fn test_new_seeds_genesis() {
        let ledger = Ledger::in_memory(&config(), MockExecutor::new()).unwrap();

        assert_eq!(ledger.next_message_number(), 1);
        assert_eq!(ledger.minimum_fee(), U256::from(2));
        assert_eq!(
            ledger.finalized_state(),
            FinalizedState { last_finalized_block: 0, last_finalized_timestamp: 100 }
        );
        assert_eq!(ledger.state_root(0), Some(ROOT));
        assert_eq!(ledger.chunk(B256::ZERO).map(|chunk| chunk.final_state_root_hash), Some(ROOT));
        assert_eq!(ledger.rate_limit().period_end, 86_500);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_new_rejects_zero_period() {
        let mut config = config();
        config.rate_limit.period_seconds = 0;
        assert!(matches!(
            Ledger::in_memory(&config, MockExecutor::new()),
            Err(LedgerError::RateLimit(canal_messaging::RateLimitError::PeriodIsZero))
        ));
    }

    #[test]
    fn test_set_and_unset_verifier() {
        let ledger = Ledger::in_memory(&config(), MockExecutor::new()).unwrap();
        let ctx = admin();

        ledger.set_verifier(&ctx, 1, Box::new(MockVerifier::accepting())).unwrap();
        assert!(ledger.has_verifier(1));
        ledger.unset_verifier(&ctx, 1).unwrap();
        assert!(!ledger.has_verifier(1));

        assert_eq!(
            ledger.drain_events(),
            vec![
                BridgeEvent::VerifierChanged { caller: ADMIN, index: 1, installed: true },
                BridgeEvent::VerifierChanged { caller: ADMIN, index: 1, installed: false },
            ]
        );
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_set_verifier_requires_role() {
        let ledger = Ledger::in_memory(&config(), MockExecutor::new()).unwrap();
        let ctx = CallContext::new(ADMIN, 200);

        let err = ledger.set_verifier(&ctx, 0, Box::new(MockVerifier::accepting())).unwrap_err();
        assert_eq!(
            err.access(),
            Some(&AccessError::Unauthorized { account: ADMIN, role: Role::VerifierSetter })
        );
        assert!(!ledger.has_verifier(0));
    }

    #[test]
    fn test_general_pause_blocks_submission() {
        let ledger = Ledger::in_memory(&config(), MockExecutor::new()).unwrap();
        ledger.pause(&admin(), PauseType::General).unwrap();

        let data = canal_rollup::test_utils::chunk_data(B256::ZERO, ROOT, 1, 10, 1);
        let err = ledger.submit(&canal_rollup::test_utils::operator(), &data, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Rollup(RollupError::Access(AccessError::IsPaused(PauseType::General)))
        );

        ledger.unpause(&admin(), PauseType::General).unwrap();
        ledger.submit(&canal_rollup::test_utils::operator(), &data, None).unwrap();
    }

    #[test]
    fn test_send_uses_configured_minimum_fee() {
        let ledger = Ledger::in_memory(&config(), MockExecutor::new()).unwrap();
        let ctx = CallContext::new(ADMIN, 200).with_value(U256::from(10));

        assert!(matches!(
            ledger.send(&ctx, address!("0x0000000000000000000000000000000000000b0b"), U256::from(1), Bytes::new()),
            Err(LedgerError::Messaging(canal_messaging::MessagingError::FeeTooLow { .. }))
        ));
        let message = ledger
            .send(&ctx, address!("0x0000000000000000000000000000000000000b0b"), U256::from(2), Bytes::new())
            .unwrap();
        assert_eq!(message.number, 1);
        assert_eq!(ledger.outbox_status(message.hash()), OutboxStatus::Sent);
        assert!(ledger.rolling_hash(1).is_some());
    }
}
