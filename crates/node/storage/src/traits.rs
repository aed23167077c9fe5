use alloy_primitives::{B256, U256};
use canal_primitives::{
    AccessError, BridgeEvent, DataChunk, FinalizedState, InboxStatus, OutboxStatus, PauseType,
    RateLimitState,
};

/// A position in the write journal.
///
/// Obtained from [`Transactional::checkpoint`] and consumed by exactly one of
/// [`Transactional::commit`] or [`Transactional::revert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub(crate) journal_len: usize,
    pub(crate) event_len: usize,
}

/// Storage that can group writes into failure-atomic units.
///
/// Checkpoints nest: a checkpoint opened while another is open belongs to the outer one, and
/// reverting the outer checkpoint also reverts writes committed under the inner one.
pub trait Transactional {
    /// Opens a checkpoint at the current journal position.
    fn checkpoint(&mut self) -> Checkpoint;

    /// Keeps every write made since `checkpoint`.
    fn commit(&mut self, checkpoint: Checkpoint);

    /// Undoes every write made since `checkpoint`.
    fn revert(&mut self, checkpoint: Checkpoint);

    /// Runs `f` inside a checkpoint, reverting all of its writes if it fails.
    fn atomically<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E>
    where
        Self: Sized,
    {
        let checkpoint = self.checkpoint();
        match f(self) {
            Ok(value) => {
                self.commit(checkpoint);
                Ok(value)
            }
            Err(err) => {
                self.revert(checkpoint);
                Err(err)
            }
        }
    }
}

/// Append-only log of notifications.
pub trait EventStorage {
    /// Appends `event` to the log.
    fn emit(&mut self, event: BridgeEvent);

    /// Returns the events emitted so far.
    fn events(&self) -> &[BridgeEvent];

    /// Removes and returns all events.
    ///
    /// Must only be called while no checkpoint is open.
    fn drain_events(&mut self) -> Vec<BridgeEvent>;
}

/// Storage for the message bridge: sequence counter, inbox and outbox, rolling hashes, the
/// claimed-number bitmap and anchored remote roots.
pub trait MessageStorage {
    /// Returns the number the next sent message will be assigned.
    fn next_message_number(&self) -> u64;

    /// Sets the number the next sent message will be assigned.
    fn set_next_message_number(&mut self, number: u64);

    /// Returns the outbox status of `hash`.
    fn outbox_status(&self, hash: B256) -> OutboxStatus;

    /// Sets the outbox status of `hash`.
    fn set_outbox_status(&mut self, hash: B256, status: OutboxStatus);

    /// Returns the inbox status of `hash`.
    fn inbox_status(&self, hash: B256) -> InboxStatus;

    /// Sets the inbox status of `hash`.
    fn set_inbox_status(&mut self, hash: B256, status: InboxStatus);

    /// Returns the outbound rolling hash stored at message `number`, if any.
    fn rolling_hash(&self, number: u64) -> Option<B256>;

    /// Stores the outbound rolling hash at message `number`.
    fn set_rolling_hash(&mut self, number: u64, rolling_hash: B256);

    /// Returns the number of the last anchored inbound message.
    fn last_inbound_message_number(&self) -> u64;

    /// Sets the number of the last anchored inbound message.
    fn set_last_inbound_message_number(&mut self, number: u64);

    /// Returns the inbound rolling hash stored at message `number`, if any.
    fn inbound_rolling_hash(&self, number: u64) -> Option<B256>;

    /// Stores the inbound rolling hash at message `number`.
    fn set_inbound_rolling_hash(&mut self, number: u64, rolling_hash: B256);

    /// Returns the claimed-bitmap word at `index`.
    fn claimed_word(&self, index: u64) -> U256;

    /// Stores the claimed-bitmap word at `index`.
    fn set_claimed_word(&mut self, index: u64, word: U256);

    /// Returns the depth of the anchored remote tree with `root`, if anchored.
    fn merkle_root_depth(&self, root: B256) -> Option<u64>;

    /// Anchors the remote tree `root` with `depth`.
    fn set_merkle_root_depth(&mut self, root: B256, depth: u64);

    /// Returns the minimum fee a sent message must carry.
    fn minimum_fee(&self) -> U256;

    /// Sets the minimum fee a sent message must carry.
    fn set_minimum_fee(&mut self, fee: U256);
}

/// Storage for the rate limiter singleton.
pub trait RateLimitStorage {
    /// Returns the rate limiter state.
    fn rate_limit(&self) -> RateLimitState;

    /// Replaces the rate limiter state.
    fn set_rate_limit(&mut self, state: RateLimitState);
}

/// Storage for pause flags.
pub trait PauseStorage {
    /// Returns whether `pause_type` is set.
    fn is_paused(&self, pause_type: PauseType) -> bool;

    /// Sets or clears `pause_type`.
    fn set_paused(&mut self, pause_type: PauseType, paused: bool);

    /// Fails with [`AccessError::IsPaused`] if either the general flag or `pause_type` is set.
    fn ensure_not_paused(&self, pause_type: PauseType) -> Result<(), AccessError> {
        if self.is_paused(PauseType::General) {
            return Err(AccessError::IsPaused(PauseType::General));
        }
        if self.is_paused(pause_type) {
            return Err(AccessError::IsPaused(pause_type));
        }
        Ok(())
    }
}

/// Storage for submitted chunks and the finalized head.
pub trait RollupStorage {
    /// Returns the chunk recorded under `data_hash`, if any.
    ///
    /// # Arguments
    /// * `data_hash` - The `keccak256` of the chunk's compressed data. The zero hash addresses
    ///   the genesis chunk.
    fn chunk(&self, data_hash: B256) -> Option<DataChunk>;

    /// Records `chunk` under its data hash.
    fn put_chunk(&mut self, chunk: DataChunk);

    /// Returns the finalized head.
    fn finalized_state(&self) -> FinalizedState;

    /// Replaces the finalized head.
    fn set_finalized_state(&mut self, state: FinalizedState);

    /// Returns the finalized state root of `block`, if `block` was a finalization point.
    fn state_root(&self, block: u64) -> Option<B256>;

    /// Records the finalized state root of `block`.
    fn set_state_root(&mut self, block: u64, root: B256);
}

/// Everything the ledger needs from its store.
pub trait LedgerStorage:
    Transactional + EventStorage + MessageStorage + RateLimitStorage + PauseStorage + RollupStorage
{
}

impl<T> LedgerStorage for T where
    T: Transactional
        + EventStorage
        + MessageStorage
        + RateLimitStorage
        + PauseStorage
        + RollupStorage
{
}
