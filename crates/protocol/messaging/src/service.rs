//! Send and claim orchestration.

use crate::{
    DeliveryCall, Executor, FeePolicy, MerkleClaimVerifier, MessageRegistry, MessagingError,
    RateLimiter, ReentrancyGuard,
};
use alloy_primitives::{Address, B256, Bytes, U256};
use canal_primitives::{BridgeEvent, CallContext, Message, PauseType, Role};
use canal_storage::{
    EventStorage, MessageStorage, PauseStorage, RateLimitStorage, SharedStore, Transactional,
};
use tracing::{debug, warn};

/// A claim of an inbound message backed by a Merkle proof against an anchored remote root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimProof {
    /// The claimed message.
    pub message: Message,
    /// The sibling path from the message's leaf to `root`.
    pub proof: Vec<B256>,
    /// The position of the message's leaf in the tree.
    pub leaf_index: u32,
    /// The anchored tree root.
    pub root: B256,
    /// The account paid the fee, or the zero address to pay the caller.
    pub fee_recipient: Address,
}

/// Orchestrates sending and claiming messages over a shared store.
///
/// Every entry point runs as one failure-atomic unit spanning the store and the [`Executor`].
/// The store is never borrowed while the executor runs a delivery, so recipients may call back
/// into the service. Only reentrant claims are rejected.
#[derive(Debug)]
pub struct MessageService<S, X> {
    store: SharedStore<S>,
    executor: X,
    guard: ReentrancyGuard,
    fee_policy: FeePolicy,
    rolling_hash_activation: u64,
}

impl<S, X> MessageService<S, X>
where
    S: Transactional + EventStorage + MessageStorage + RateLimitStorage + PauseStorage,
    X: Executor,
{
    /// Creates a service over `store` delivering through `executor`.
    pub fn new(store: SharedStore<S>, executor: X) -> Self {
        Self {
            store,
            executor,
            guard: ReentrancyGuard::new(),
            fee_policy: FeePolicy::default(),
            rolling_hash_activation: 0,
        }
    }

    /// Sets the fee policy applied to claims.
    pub const fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    /// Only chains messages numbered `number` and above into the rolling hash.
    pub const fn with_rolling_hash_activation(mut self, number: u64) -> Self {
        self.rolling_hash_activation = number;
        self
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Returns the fee policy.
    pub const fn fee_policy(&self) -> FeePolicy {
        self.fee_policy
    }

    /// Returns the rolling-hash activation number.
    pub const fn rolling_hash_activation(&self) -> u64 {
        self.rolling_hash_activation
    }

    /// Sends a message carrying the call's value, minus `fee`, to `recipient` on the remote
    /// layer.
    pub fn send(
        &self,
        ctx: &CallContext,
        recipient: Address,
        fee: U256,
        calldata: Bytes,
    ) -> Result<Message, MessagingError> {
        let result = self.store.borrow_mut().atomically(|store| {
            store.ensure_not_paused(PauseType::Outbound)?;
            if recipient.is_zero() {
                return Err(MessagingError::ZeroAddressNotAllowed);
            }
            if ctx.value < fee {
                return Err(MessagingError::ValueSentTooLow { value: ctx.value, fee });
            }
            let minimum = store.minimum_fee();
            if fee < minimum {
                return Err(MessagingError::FeeTooLow { fee, minimum });
            }

            RateLimiter::new(store).consume(ctx.value, ctx.timestamp)?;
            let message = MessageRegistry::new(store)
                .with_rolling_hash_activation(self.rolling_hash_activation)
                .record(ctx.caller, recipient, fee, ctx.value - fee, calldata);

            let hash = message.hash();
            store.emit(BridgeEvent::MessageSent {
                sender: message.sender,
                recipient: message.recipient,
                fee: message.fee,
                value: message.value,
                number: message.number,
                calldata: message.calldata.clone(),
                hash,
            });
            debug!(target: "messaging", number = message.number, %hash, "Sent message");
            Ok(message)
        });

        result.inspect_err(|err| warn!(target: "messaging", %err, "Send rejected"))
    }

    /// Claims an inbound message made claimable by hash, delivering it to its recipient.
    ///
    /// The fee goes to `fee_recipient`, or to the caller if `fee_recipient` is zero. Returns the
    /// message hash.
    pub fn claim(
        &self,
        ctx: &CallContext,
        message: &Message,
        fee_recipient: Address,
    ) -> Result<B256, MessagingError> {
        let _entered = self.guard.enter().ok_or(MessagingError::ReentrantCall)?;
        let hash = message.hash();

        self.transact(|| {
            {
                let mut store = self.store.borrow_mut();
                store.ensure_not_paused(PauseType::Inbound)?;
                MessageRegistry::new(&mut *store).mark_claimed(hash)?;
            }
            self.deliver(ctx, message, hash, fee_recipient)
        })
        .inspect_err(|err| warn!(target: "messaging", %hash, %err, "Claim rejected"))
    }

    /// Claims an inbound message by proving its inclusion in an anchored remote tree.
    ///
    /// Replays are rejected by message number. Returns the message hash.
    pub fn claim_with_proof(
        &self,
        ctx: &CallContext,
        claim: &ClaimProof,
    ) -> Result<B256, MessagingError> {
        let _entered = self.guard.enter().ok_or(MessagingError::ReentrantCall)?;
        let hash = claim.message.hash();

        self.transact(|| {
            {
                let mut store = self.store.borrow_mut();
                store.ensure_not_paused(PauseType::Inbound)?;
                let included = MerkleClaimVerifier::new(&*store).verify(
                    &claim.message,
                    &claim.proof,
                    claim.leaf_index,
                    claim.root,
                )?;
                if !included {
                    return Err(MessagingError::InvalidMerkleProof);
                }
                MessageRegistry::new(&mut *store).mark_number_claimed(claim.message.number, hash)?;
            }
            self.deliver(ctx, &claim.message, hash, claim.fee_recipient)
        })
        .inspect_err(|err| warn!(target: "messaging", %hash, %err, "Proof claim rejected"))
    }

    /// Changes the minimum fee a sent message must carry.
    pub fn set_minimum_fee(&self, ctx: &CallContext, fee: U256) -> Result<(), MessagingError> {
        ctx.require_role(Role::MinimumFeeSetter)?;

        let mut store = self.store.borrow_mut();
        let previous_fee = store.minimum_fee();
        store.set_minimum_fee(fee);
        store.emit(BridgeEvent::MinimumFeeChanged { caller: ctx.caller, previous_fee, new_fee: fee });
        debug!(target: "messaging", %previous_fee, new_fee = %fee, "Changed minimum fee");
        Ok(())
    }

    /// Consumes the rate limit, delivers `message` and pays its fee.
    fn deliver(
        &self,
        ctx: &CallContext,
        message: &Message,
        hash: B256,
        fee_recipient: Address,
    ) -> Result<B256, MessagingError> {
        RateLimiter::new(&mut *self.store.borrow_mut()).consume(message.value, ctx.timestamp)?;

        let call = DeliveryCall {
            sender: message.sender,
            recipient: message.recipient,
            value: message.value,
            calldata: &message.calldata,
        };
        self.executor.deliver(call).map_err(|reason| MessagingError::MessageSendingFailed {
            recipient: message.recipient,
            reason,
        })?;

        if !message.fee.is_zero() {
            let receiver = if fee_recipient.is_zero() { ctx.caller } else { fee_recipient };
            let split = self.fee_policy.split(message.fee, !message.calldata.is_empty());
            self.pay(receiver, split.fee)?;
            self.pay(message.recipient, split.refund)?;
        }

        self.store.borrow_mut().emit(BridgeEvent::MessageClaimed { hash });
        debug!(target: "messaging", number = message.number, %hash, "Claimed message");
        Ok(hash)
    }

    fn pay(&self, recipient: Address, amount: U256) -> Result<(), MessagingError> {
        if amount.is_zero() {
            return Ok(());
        }
        self.executor
            .transfer(recipient, amount)
            .map_err(|reason| MessagingError::FeePaymentFailed { recipient, reason })
    }

    /// Runs `f` inside a checkpoint of both the store and the executor.
    fn transact<T>(
        &self,
        f: impl FnOnce() -> Result<T, MessagingError>,
    ) -> Result<T, MessagingError> {
        let checkpoint = self.store.borrow_mut().checkpoint();
        let executor_checkpoint = self.executor.checkpoint();
        match f() {
            Ok(value) => {
                self.executor.commit(executor_checkpoint);
                self.store.borrow_mut().commit(checkpoint);
                Ok(value)
            }
            Err(err) => {
                self.executor.revert(executor_checkpoint);
                self.store.borrow_mut().revert(checkpoint);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecutionError, MerkleTree, RateLimitError, RegistryError, test_utils::MockExecutor};
    use alloy_primitives::{address, bytes};
    use canal_primitives::{AccessError, InboxStatus, OutboxStatus};
    use canal_storage::MemoryDb;
    use std::rc::Rc;

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
    const CAROL: Address = address!("0x000000000000000000000000000000000000ca01");
    const POSTMAN: Address = address!("0x0000000000000000000000000000000000005057");

    type Service = MessageService<MemoryDb, MockExecutor>;

    fn service() -> Service {
        let mut db = MemoryDb::new();
        db.set_next_message_number(1);
        RateLimiter::new(&mut db).initialize(86_400, U256::from(1_000), 0).unwrap();
        MessageService::new(SharedStore::new(db), MockExecutor::new())
    }

    fn inbound(number: u64, fee: u64, value: u64) -> Message {
        Message {
            sender: ALICE,
            recipient: BOB,
            fee: U256::from(fee),
            value: U256::from(value),
            number,
            calldata: Bytes::new(),
        }
    }

    fn deliverable(service: &Service, message: &Message) {
        service.store.borrow_mut().set_inbox_status(message.hash(), InboxStatus::Received);
    }

    fn postman(timestamp: u64) -> CallContext {
        CallContext::new(POSTMAN, timestamp)
    }

    #[test]
    fn test_send_records_message() {
        let service = service();
        let ctx = CallContext::new(ALICE, 10).with_value(U256::from(100));
        let message = service.send(&ctx, BOB, U256::from(5), bytes!("0xdeadbeef")).unwrap();

        assert_eq!(message.number, 1);
        assert_eq!(message.value, U256::from(95));
        let store = service.store.borrow();
        assert_eq!(store.outbox_status(message.hash()), OutboxStatus::Sent);
        assert_eq!(store.rate_limit().used_in_period, U256::from(100));
        assert!(matches!(
            store.events().last(),
            Some(BridgeEvent::MessageSent { number: 1, hash, .. }) if *hash == message.hash()
        ));
    }

    #[test]
    fn test_send_preconditions() {
        let service = service();
        let ctx = CallContext::new(ALICE, 10).with_value(U256::from(4));

        assert_eq!(
            service.send(&ctx, Address::ZERO, U256::ZERO, Bytes::new()),
            Err(MessagingError::ZeroAddressNotAllowed)
        );
        assert_eq!(
            service.send(&ctx, BOB, U256::from(5), Bytes::new()),
            Err(MessagingError::ValueSentTooLow { value: U256::from(4), fee: U256::from(5) })
        );

        let setter = CallContext::new(CAROL, 10).with_role(Role::MinimumFeeSetter);
        service.set_minimum_fee(&setter, U256::from(3)).unwrap();
        assert_eq!(
            service.send(&ctx, BOB, U256::from(2), Bytes::new()),
            Err(MessagingError::FeeTooLow { fee: U256::from(2), minimum: U256::from(3) })
        );

        let big = CallContext::new(ALICE, 10).with_value(U256::from(1_001));
        assert!(matches!(
            service.send(&big, BOB, U256::from(3), Bytes::new()),
            Err(MessagingError::RateLimit(RateLimitError::RateLimitExceeded { .. }))
        ));
        assert_eq!(service.store.borrow().next_message_number(), 1);
    }

    #[test]
    fn test_send_respects_pause() {
        let service = service();
        service.store.borrow_mut().set_paused(PauseType::Outbound, true);
        let ctx = CallContext::new(ALICE, 10).with_value(U256::from(1));
        assert_eq!(
            service.send(&ctx, BOB, U256::ZERO, Bytes::new()),
            Err(MessagingError::Access(AccessError::IsPaused(PauseType::Outbound)))
        );
    }

    #[test]
    fn test_claim_delivers_exactly_once() {
        let service = service();
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);

        let hash = service.claim(&postman(5), &message, Address::ZERO).unwrap();
        assert_eq!(hash, message.hash());
        assert_eq!(service.executor().balance(BOB), U256::from(90));
        assert_eq!(service.executor().balance(POSTMAN), U256::from(10));

        assert_eq!(
            service.claim(&postman(6), &message, Address::ZERO),
            Err(MessagingError::Registry(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(
                hash
            )))
        );
        assert_eq!(service.executor().deliveries().len(), 1);
    }

    #[test]
    fn test_claim_pays_fee_recipient() {
        let service = service();
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);

        service.claim(&postman(5), &message, CAROL).unwrap();
        assert_eq!(service.executor().balance(CAROL), U256::from(10));
        assert_eq!(service.executor().balance(POSTMAN), U256::ZERO);
    }

    #[test]
    fn test_claim_with_refund_policy() {
        let service = service()
            .with_fee_policy(FeePolicy { refund_enabled: true, delivery_cost: U256::from(4) });
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);

        service.claim(&postman(5), &message, Address::ZERO).unwrap();
        assert_eq!(service.executor().balance(POSTMAN), U256::from(4));
        assert_eq!(service.executor().balance(BOB), U256::from(96));
    }

    #[test]
    fn test_failed_delivery_rolls_back() {
        let service = service();
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);
        service.executor().set_rejecting(BOB);

        assert!(matches!(
            service.claim(&postman(5), &message, Address::ZERO),
            Err(MessagingError::MessageSendingFailed { recipient: BOB, .. })
        ));
        let store = service.store.borrow();
        assert_eq!(store.inbox_status(message.hash()), InboxStatus::Received);
        assert_eq!(store.rate_limit().used_in_period, U256::ZERO);
        assert!(store.events().is_empty());
        drop(store);

        // The message stays claimable.
        service.executor().clear_rejecting(BOB);
        service.claim(&postman(6), &message, Address::ZERO).unwrap();
    }

    #[test]
    fn test_failed_fee_payment_rolls_back_delivery() {
        let service = service();
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);
        service.executor().set_rejecting(CAROL);

        assert!(matches!(
            service.claim(&postman(5), &message, CAROL),
            Err(MessagingError::FeePaymentFailed { recipient: CAROL, .. })
        ));
        assert_eq!(service.executor().balance(BOB), U256::ZERO);
        assert!(service.executor().deliveries().is_empty());
        assert_eq!(service.store.borrow().inbox_status(message.hash()), InboxStatus::Received);
    }

    #[test]
    fn test_claim_respects_inbound_pause() {
        let service = service();
        let message = inbound(1, 0, 1);
        deliverable(&service, &message);
        service.store.borrow_mut().set_paused(PauseType::General, true);

        assert_eq!(
            service.claim(&postman(5), &message, Address::ZERO),
            Err(MessagingError::Access(AccessError::IsPaused(PauseType::General)))
        );
    }

    #[test]
    fn test_reentrant_claim_is_rejected() {
        let service = Rc::new(service());
        let first = inbound(1, 0, 10);
        let second = inbound(2, 0, 10);
        deliverable(&service, &first);
        deliverable(&service, &second);

        let weak = Rc::downgrade(&service);
        let reentered = second.clone();
        service.executor().set_hook(move |call| {
            let Some(service) = weak.upgrade() else { return Ok(()) };
            if call.recipient != BOB || call.value != U256::from(10) {
                return Ok(());
            }
            match service.claim(&CallContext::new(BOB, 5), &reentered, Address::ZERO) {
                Err(MessagingError::ReentrantCall) => {
                    Err(ExecutionError::Reverted("reentrancy blocked".into()))
                }
                other => panic!("unexpected reentrant result: {other:?}"),
            }
        });

        assert!(matches!(
            service.claim(&postman(5), &first, Address::ZERO),
            Err(MessagingError::MessageSendingFailed { .. })
        ));
        assert_eq!(service.store.borrow().inbox_status(second.hash()), InboxStatus::Received);
    }

    #[test]
    fn test_send_during_delivery_is_reverted_with_claim() {
        let service = Rc::new(service());
        let message = inbound(1, 10, 90);
        deliverable(&service, &message);

        let weak = Rc::downgrade(&service);
        service.executor().set_hook(move |_| {
            if let Some(service) = weak.upgrade() {
                let ctx = CallContext::new(BOB, 5).with_value(U256::from(1));
                service.send(&ctx, ALICE, U256::ZERO, Bytes::new()).map_err(|err| {
                    ExecutionError::Reverted(err.to_string())
                })?;
            }
            Ok(())
        });
        service.executor().set_rejecting(POSTMAN);

        assert!(service.claim(&postman(5), &message, Address::ZERO).is_err());
        let store = service.store.borrow();
        assert_eq!(store.next_message_number(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_claim_with_proof() {
        let service = service();
        let messages: Vec<_> = (1..=3).map(|n| inbound(n, 1, 10)).collect();
        let tree = MerkleTree::new(messages.iter().map(Message::hash).collect(), 2).unwrap();
        service.store.borrow_mut().set_merkle_root_depth(tree.root(), 2);

        let claim = ClaimProof {
            message: messages[1].clone(),
            proof: tree.proof(1).unwrap(),
            leaf_index: 1,
            root: tree.root(),
            fee_recipient: Address::ZERO,
        };
        assert_eq!(service.claim_with_proof(&postman(5), &claim), Ok(messages[1].hash()));
        assert_eq!(
            service.claim_with_proof(&postman(5), &claim),
            Err(MessagingError::Registry(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(
                messages[1].hash()
            )))
        );

        let forged = ClaimProof { leaf_index: 2, ..claim.clone() };
        assert_eq!(
            service.claim_with_proof(&postman(5), &ClaimProof { message: messages[2].clone(), ..forged }),
            Err(MessagingError::InvalidMerkleProof)
        );
    }

    #[test]
    fn test_claim_consumes_rate_limit() {
        let service = service();
        let message = inbound(1, 0, 1_001);
        deliverable(&service, &message);

        assert!(matches!(
            service.claim(&postman(5), &message, Address::ZERO),
            Err(MessagingError::RateLimit(RateLimitError::RateLimitExceeded { .. }))
        ));
        assert!(service.executor().deliveries().is_empty());
    }
}
