//! Inbox and outbox bookkeeping and the outbound rolling-hash chain.

use alloy_primitives::{Address, B256, Bytes, U256};
use canal_primitives::{
    AccessError, BridgeEvent, CallContext, EMPTY_HASH, InboxStatus, Message, OutboxStatus, Role,
    rolling_hash,
};
use canal_storage::{EventStorage, MessageStorage};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// The largest number of hashes accepted by a single batch operation.
pub const MAX_MESSAGE_HASHES: usize = 100;

/// Errors raised by the [`MessageRegistry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The inbound hash is already known.
    #[error("message {0} was already received")]
    MessageAlreadyReceived(B256),
    /// The inbound hash is unknown or was already claimed.
    #[error("message {0} does not exist or has already been claimed")]
    MessageDoesNotExistOrHasAlreadyBeenClaimed(B256),
    /// An acknowledged hash was never sent from this layer.
    #[error("message {0} was not sent")]
    MessageNotSent(B256),
    /// A batch contained no hashes.
    #[error("message hash list is empty")]
    MessageHashesListLengthIsZero,
    /// A batch contained more than [`MAX_MESSAGE_HASHES`] hashes.
    #[error("message hash list has {0} entries, at most 100 are allowed")]
    MessageHashesListLengthHigherThanOneHundred(usize),
    /// A rolling hash was claimed for message number zero.
    #[error("rolling hash {0} was given without a message number")]
    MissingMessageNumberForRollingHash(B256),
    /// No rolling hash was claimed for a non-zero message number.
    #[error("no rolling hash was given for message number {0}")]
    MissingRollingHashForMessageNumber(u64),
    /// The claimed rolling hash does not match the one recorded for the number.
    #[error("rolling hash {rolling_hash} does not exist for message number {number}")]
    L1RollingHashDoesNotExistOnL1 {
        /// The message number.
        number: u64,
        /// The claimed rolling hash.
        rolling_hash: B256,
    },
    /// A batch of inbound hashes does not continue the inbound message sequence.
    #[error("inbound message number mismatch: expected {expected}, got {actual}")]
    InboundMessageNumberSynchronizationWrong {
        /// The number the ledger expected.
        expected: u64,
        /// The number the caller supplied.
        actual: u64,
    },
    /// A batch of inbound hashes does not reproduce the claimed inbound rolling hash.
    #[error("inbound rolling hash mismatch: expected {expected}, got {actual}")]
    InboundRollingHashSynchronizationWrong {
        /// The rolling hash computed by the ledger.
        expected: B256,
        /// The rolling hash the caller supplied.
        actual: B256,
    },
    /// The caller lacks the message-hash setter role.
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Returns whether the inbound message `number` was claimed with a proof.
pub fn is_number_claimed<S: MessageStorage>(store: &S, number: u64) -> bool {
    let (index, mask) = bitmap_position(number);
    !(store.claimed_word(index) & mask).is_zero()
}

/// The message registry over a store.
#[derive(Debug)]
pub struct MessageRegistry<'s, S> {
    store: &'s mut S,
    rolling_hash_activation: u64,
}

impl<'s, S> MessageRegistry<'s, S>
where
    S: MessageStorage + EventStorage,
{
    /// Creates a registry over `store` that chains every message into the rolling hash.
    pub const fn new(store: &'s mut S) -> Self {
        Self { store, rolling_hash_activation: 0 }
    }

    /// Only chains messages numbered `number` and above into the rolling hash.
    pub fn with_rolling_hash_activation(mut self, number: u64) -> Self {
        self.rolling_hash_activation = number;
        self
    }

    /// Records an outbound message and returns it with its assigned number.
    ///
    /// The message is marked [`OutboxStatus::Sent`]. If its number is at or past the rolling-hash
    /// activation number, it is also folded into the outbound rolling hash.
    pub fn record(
        &mut self,
        sender: Address,
        recipient: Address,
        fee: U256,
        value: U256,
        calldata: Bytes,
    ) -> Message {
        let number = self.store.next_message_number();
        self.store.set_next_message_number(number + 1);

        let message = Message { sender, recipient, fee, value, number, calldata };
        let hash = message.hash();
        self.store.set_outbox_status(hash, OutboxStatus::Sent);

        if number >= self.rolling_hash_activation {
            let previous = number
                .checked_sub(1)
                .and_then(|previous| self.store.rolling_hash(previous))
                .unwrap_or(EMPTY_HASH);
            let rolling = rolling_hash(previous, hash);
            self.store.set_rolling_hash(number, rolling);
            self.store.emit(BridgeEvent::RollingHashUpdated {
                number,
                rolling_hash: rolling,
                message_hash: hash,
            });
            trace!(target: "messaging", number, %rolling, "Advanced rolling hash");
        }

        message
    }

    /// Makes an inbound message claimable.
    pub fn mark_deliverable(&mut self, ctx: &CallContext, hash: B256) -> Result<(), RegistryError> {
        ctx.require_role(Role::MessageHashSetter)?;
        if self.store.inbox_status(hash) != InboxStatus::Unknown {
            return Err(RegistryError::MessageAlreadyReceived(hash));
        }
        self.store.set_inbox_status(hash, InboxStatus::Received);
        self.store.emit(BridgeEvent::MessageHashesAddedToInbox { hashes: vec![hash] });
        Ok(())
    }

    /// Marks a claimable inbound message as claimed.
    ///
    /// This is the only replay protection for claims by hash.
    pub fn mark_claimed(&mut self, hash: B256) -> Result<(), RegistryError> {
        if self.store.inbox_status(hash) != InboxStatus::Received {
            return Err(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(hash));
        }
        self.store.set_inbox_status(hash, InboxStatus::Claimed);
        Ok(())
    }

    /// Returns whether the inbound message `number` was claimed with a proof.
    pub fn is_number_claimed(&self, number: u64) -> bool {
        is_number_claimed(&*self.store, number)
    }

    /// Marks the inbound message `number`, whose hash is `leaf_hash`, as claimed with a proof.
    pub fn mark_number_claimed(&mut self, number: u64, leaf_hash: B256) -> Result<(), RegistryError> {
        let (index, mask) = bitmap_position(number);
        let word = self.store.claimed_word(index);
        if !(word & mask).is_zero() {
            return Err(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(leaf_hash));
        }
        self.store.set_claimed_word(index, word | mask);
        Ok(())
    }

    /// Records that the remote layer received the outbound messages `hashes`.
    ///
    /// Acknowledging an already acknowledged hash is a no-op.
    pub fn acknowledge_delivered(
        &mut self,
        ctx: &CallContext,
        hashes: &[B256],
    ) -> Result<(), RegistryError> {
        ctx.require_role(Role::MessageHashSetter)?;
        if hashes.len() > MAX_MESSAGE_HASHES {
            return Err(RegistryError::MessageHashesListLengthHigherThanOneHundred(hashes.len()));
        }

        if let Some(&hash) =
            hashes.iter().find(|&&hash| self.store.outbox_status(hash) == OutboxStatus::Unknown)
        {
            warn!(target: "messaging", %hash, "Acknowledged message was never sent");
            return Err(RegistryError::MessageNotSent(hash));
        }
        for &hash in hashes {
            self.store.set_outbox_status(hash, OutboxStatus::Received);
        }

        if !hashes.is_empty() {
            self.store.emit(BridgeEvent::MessagesAcknowledged { hashes: hashes.to_vec() });
        }
        Ok(())
    }

    /// Checks a rolling hash claimed by a finalization record against the outbound chain.
    pub fn validate_rolling_hash(&self, number: u64, claimed: B256) -> Result<(), RegistryError> {
        if number == 0 {
            if claimed != EMPTY_HASH {
                return Err(RegistryError::MissingMessageNumberForRollingHash(claimed));
            }
            return Ok(());
        }

        if claimed == EMPTY_HASH {
            return Err(RegistryError::MissingRollingHashForMessageNumber(number));
        }
        if self.store.rolling_hash(number) != Some(claimed) {
            return Err(RegistryError::L1RollingHashDoesNotExistOnL1 {
                number,
                rolling_hash: claimed,
            });
        }
        Ok(())
    }

    /// Anchors a batch of inbound message hashes, continuing the inbound rolling hash.
    ///
    /// Hashes that are already known are skipped and neither advance the inbound message number
    /// nor the rolling hash. The resulting number and rolling hash must match `final_number` and
    /// `final_rolling_hash`.
    pub fn anchor_message_hashes(
        &mut self,
        ctx: &CallContext,
        hashes: &[B256],
        start_number: u64,
        final_number: u64,
        final_rolling_hash: B256,
    ) -> Result<(), RegistryError> {
        ctx.require_role(Role::MessageHashSetter)?;
        if hashes.is_empty() {
            return Err(RegistryError::MessageHashesListLengthIsZero);
        }
        if hashes.len() > MAX_MESSAGE_HASHES {
            return Err(RegistryError::MessageHashesListLengthHigherThanOneHundred(hashes.len()));
        }

        let mut number = self.store.last_inbound_message_number();
        if start_number != number + 1 {
            return Err(RegistryError::InboundMessageNumberSynchronizationWrong {
                expected: number + 1,
                actual: start_number,
            });
        }

        let mut rolling = self.store.inbound_rolling_hash(number).unwrap_or(EMPTY_HASH);
        let mut inserted: Vec<B256> = Vec::with_capacity(hashes.len());
        for &hash in hashes {
            if self.store.inbox_status(hash) != InboxStatus::Unknown || inserted.contains(&hash) {
                trace!(target: "messaging", %hash, "Skipping known inbound message");
                continue;
            }
            rolling = rolling_hash(rolling, hash);
            number += 1;
            inserted.push(hash);
        }

        if number != final_number {
            return Err(RegistryError::InboundMessageNumberSynchronizationWrong {
                expected: number,
                actual: final_number,
            });
        }
        if rolling != final_rolling_hash {
            return Err(RegistryError::InboundRollingHashSynchronizationWrong {
                expected: rolling,
                actual: final_rolling_hash,
            });
        }

        for &hash in &inserted {
            self.store.set_inbox_status(hash, InboxStatus::Received);
        }
        self.store.set_last_inbound_message_number(number);
        self.store.set_inbound_rolling_hash(number, rolling);
        debug!(target: "messaging", inserted = inserted.len(), number, "Anchored inbound messages");
        self.store.emit(BridgeEvent::MessageHashesAddedToInbox { hashes: inserted });
        self.store.emit(BridgeEvent::InboundRollingHashUpdated { number, rolling_hash: rolling });
        Ok(())
    }
}

/// Returns the bitmap word index and bit mask of message `number`.
fn bitmap_position(number: u64) -> (u64, U256) {
    (number >> 8, U256::from(1) << (number & 0xff) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};
    use canal_storage::MemoryDb;
    use rstest::rstest;

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    fn db() -> MemoryDb {
        let mut db = MemoryDb::new();
        db.set_next_message_number(1);
        db
    }

    fn setter() -> CallContext {
        CallContext::new(ALICE, 0).with_role(Role::MessageHashSetter)
    }

    #[test]
    fn test_record_assigns_numbers_and_chains() {
        let mut db = db();
        let mut registry = MessageRegistry::new(&mut db);
        let first = registry.record(ALICE, BOB, U256::from(1), U256::from(10), Bytes::new());
        let second = registry.record(ALICE, BOB, U256::from(1), U256::from(10), Bytes::new());

        assert_eq!((first.number, second.number), (1, 2));
        assert_eq!(db.outbox_status(first.hash()), OutboxStatus::Sent);

        let rolling_1 = rolling_hash(EMPTY_HASH, first.hash());
        assert_eq!(db.rolling_hash(1), Some(rolling_1));
        assert_eq!(db.rolling_hash(2), Some(rolling_hash(rolling_1, second.hash())));
        assert_eq!(db.next_message_number(), 3);
    }

    #[test]
    fn test_record_before_activation_is_not_chained() {
        let mut db = db();
        let mut registry = MessageRegistry::new(&mut db).with_rolling_hash_activation(2);
        registry.record(ALICE, BOB, U256::ZERO, U256::ZERO, Bytes::new());
        let second = registry.record(ALICE, BOB, U256::ZERO, U256::ZERO, Bytes::new());

        assert_eq!(db.rolling_hash(1), None);
        // The first chained message starts from the empty hash.
        assert_eq!(db.rolling_hash(2), Some(rolling_hash(EMPTY_HASH, second.hash())));
        assert_eq!(
            db.events().iter().filter(|e| e.name() == "RollingHashUpdated").count(),
            1
        );
    }

    #[test]
    fn test_claim_lifecycle() {
        let hash = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");
        let mut db = db();
        let mut registry = MessageRegistry::new(&mut db);

        assert_eq!(
            registry.mark_claimed(hash),
            Err(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(hash))
        );
        registry.mark_deliverable(&setter(), hash).unwrap();
        assert_eq!(
            registry.mark_deliverable(&setter(), hash),
            Err(RegistryError::MessageAlreadyReceived(hash))
        );
        registry.mark_claimed(hash).unwrap();
        assert_eq!(
            registry.mark_claimed(hash),
            Err(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(hash))
        );
        // A claimed hash can never become deliverable again.
        assert_eq!(
            registry.mark_deliverable(&setter(), hash),
            Err(RegistryError::MessageAlreadyReceived(hash))
        );
        assert_eq!(db.inbox_status(hash), InboxStatus::Claimed);
    }

    #[test]
    fn test_mark_deliverable_requires_role() {
        let mut db = db();
        let ctx = CallContext::new(BOB, 0);
        assert!(matches!(
            MessageRegistry::new(&mut db).mark_deliverable(&ctx, B256::ZERO),
            Err(RegistryError::Access(_))
        ));
    }

    #[rstest]
    #[case::first_bit(0)]
    #[case::last_bit_of_word(255)]
    #[case::next_word(256)]
    #[case::large(1 << 40)]
    fn test_claimed_bitmap(#[case] number: u64) {
        let leaf = B256::repeat_byte(0x42);
        let mut db = db();
        let mut registry = MessageRegistry::new(&mut db);

        assert!(!registry.is_number_claimed(number));
        registry.mark_number_claimed(number, leaf).unwrap();
        assert!(registry.is_number_claimed(number));
        assert!(!registry.is_number_claimed(number + 1));
        assert_eq!(
            registry.mark_number_claimed(number, leaf),
            Err(RegistryError::MessageDoesNotExistOrHasAlreadyBeenClaimed(leaf))
        );

        let db = &db;
        assert!(is_number_claimed(db, number));
        assert!(!is_number_claimed(db, number + 1));
    }

    #[test]
    fn test_acknowledge_delivered() {
        let mut db = db();
        let sent = MessageRegistry::new(&mut db)
            .record(ALICE, BOB, U256::ZERO, U256::ZERO, Bytes::new())
            .hash();
        let unknown = B256::repeat_byte(0x99);
        let mut registry = MessageRegistry::new(&mut db);

        assert_eq!(
            registry.acknowledge_delivered(&setter(), &[sent, unknown]),
            Err(RegistryError::MessageNotSent(unknown))
        );
        assert_eq!(registry.store.outbox_status(sent), OutboxStatus::Sent);
        registry.acknowledge_delivered(&setter(), &[sent]).unwrap();
        registry.acknowledge_delivered(&setter(), &[sent]).unwrap();
        assert_eq!(db.outbox_status(sent), OutboxStatus::Received);
    }

    #[test]
    fn test_acknowledge_delivered_bounds_batch() {
        let mut db = db();
        let hashes = vec![B256::ZERO; MAX_MESSAGE_HASHES + 1];
        assert_eq!(
            MessageRegistry::new(&mut db).acknowledge_delivered(&setter(), &hashes),
            Err(RegistryError::MessageHashesListLengthHigherThanOneHundred(101))
        );
    }

    #[test]
    fn test_validate_rolling_hash() {
        let mut db = db();
        MessageRegistry::new(&mut db).record(ALICE, BOB, U256::ZERO, U256::ZERO, Bytes::new());
        let stored = db.rolling_hash(1).unwrap();
        let other = B256::repeat_byte(0x07);
        let registry = MessageRegistry::new(&mut db);

        assert_eq!(registry.validate_rolling_hash(0, EMPTY_HASH), Ok(()));
        assert_eq!(
            registry.validate_rolling_hash(0, other),
            Err(RegistryError::MissingMessageNumberForRollingHash(other))
        );
        assert_eq!(
            registry.validate_rolling_hash(1, EMPTY_HASH),
            Err(RegistryError::MissingRollingHashForMessageNumber(1))
        );
        assert_eq!(
            registry.validate_rolling_hash(1, other),
            Err(RegistryError::L1RollingHashDoesNotExistOnL1 { number: 1, rolling_hash: other })
        );
        assert_eq!(registry.validate_rolling_hash(1, stored), Ok(()));
    }

    #[test]
    fn test_anchor_message_hashes() {
        let (a, b) = (B256::repeat_byte(0x0a), B256::repeat_byte(0x0b));
        let rolling = rolling_hash(rolling_hash(EMPTY_HASH, a), b);
        let mut db = db();

        MessageRegistry::new(&mut db).anchor_message_hashes(&setter(), &[a, b], 1, 2, rolling).unwrap();
        assert_eq!(db.inbox_status(a), InboxStatus::Received);
        assert_eq!(db.last_inbound_message_number(), 2);
        assert_eq!(db.inbound_rolling_hash(2), Some(rolling));

        // A known hash is skipped, the new one continues the chain.
        let c = B256::repeat_byte(0x0c);
        let next = rolling_hash(rolling, c);
        MessageRegistry::new(&mut db).anchor_message_hashes(&setter(), &[b, c], 3, 3, next).unwrap();
        assert_eq!(db.last_inbound_message_number(), 3);
        assert_eq!(
            db.events().last(),
            Some(&BridgeEvent::InboundRollingHashUpdated { number: 3, rolling_hash: next })
        );
    }

    #[test]
    fn test_anchor_message_hashes_rejects_out_of_sync() {
        let a = B256::repeat_byte(0x0a);
        let rolling = rolling_hash(EMPTY_HASH, a);
        let mut db = db();
        let mut registry = MessageRegistry::new(&mut db);

        assert_eq!(
            registry.anchor_message_hashes(&setter(), &[], 1, 1, rolling),
            Err(RegistryError::MessageHashesListLengthIsZero)
        );
        assert_eq!(
            registry.anchor_message_hashes(&setter(), &[a], 2, 2, rolling),
            Err(RegistryError::InboundMessageNumberSynchronizationWrong { expected: 1, actual: 2 })
        );
        assert_eq!(
            registry.anchor_message_hashes(&setter(), &[a], 1, 2, rolling),
            Err(RegistryError::InboundMessageNumberSynchronizationWrong { expected: 1, actual: 2 })
        );
        assert_eq!(
            registry.anchor_message_hashes(&setter(), &[a], 1, 1, EMPTY_HASH),
            Err(RegistryError::InboundRollingHashSynchronizationWrong {
                expected: rolling,
                actual: EMPTY_HASH,
            })
        );
        assert_eq!(db.inbox_status(a), InboxStatus::Unknown);
        assert_eq!(db.last_inbound_message_number(), 0);
    }
}
