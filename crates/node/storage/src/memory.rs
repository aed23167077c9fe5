//! A journaled in-memory [`LedgerStorage`](crate::LedgerStorage) implementation.

use crate::{
    Checkpoint, EventStorage, MessageStorage, PauseStorage, RateLimitStorage, RollupStorage,
    Transactional,
};
use alloy_primitives::{B256, U256, map::HashMap};
use canal_primitives::{
    BridgeEvent, DataChunk, FinalizedState, InboxStatus, OutboxStatus, PauseType, RateLimitState,
};
use core::hash::Hash;
use tracing::trace;

/// The undo record of a single write.
#[derive(Debug, Clone)]
enum JournalEntry {
    NextMessageNumber(u64),
    Outbox { hash: B256, previous: Option<OutboxStatus> },
    Inbox { hash: B256, previous: Option<InboxStatus> },
    RollingHash { number: u64, previous: Option<B256> },
    LastInboundMessageNumber(u64),
    InboundRollingHash { number: u64, previous: Option<B256> },
    ClaimedWord { index: u64, previous: Option<U256> },
    MerkleRootDepth { root: B256, previous: Option<u64> },
    MinimumFee(U256),
    RateLimit(RateLimitState),
    Paused { pause_type: PauseType, previous: bool },
    Chunk { data_hash: B256, previous: Option<DataChunk> },
    FinalizedState(FinalizedState),
    StateRoot { block: u64, previous: Option<B256> },
}

/// An in-memory ledger store with an undo journal.
#[derive(Debug, Default)]
pub struct MemoryDb {
    next_message_number: u64,
    outbox: HashMap<B256, OutboxStatus>,
    inbox: HashMap<B256, InboxStatus>,
    rolling_hashes: HashMap<u64, B256>,
    last_inbound_message_number: u64,
    inbound_rolling_hashes: HashMap<u64, B256>,
    claimed: HashMap<u64, U256>,
    merkle_roots: HashMap<B256, u64>,
    minimum_fee: U256,
    rate_limit: RateLimitState,
    paused: HashMap<PauseType, bool>,
    chunks: HashMap<B256, DataChunk>,
    finalized: FinalizedState,
    state_roots: HashMap<u64, B256>,
    events: Vec<BridgeEvent>,

    journal: Vec<JournalEntry>,
    depth: usize,
}

impl MemoryDb {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of open checkpoints.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn record(&mut self, entry: JournalEntry) {
        if self.depth > 0 {
            self.journal.push(entry);
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::NextMessageNumber(previous) => self.next_message_number = previous,
            JournalEntry::Outbox { hash, previous } => restore(&mut self.outbox, hash, previous),
            JournalEntry::Inbox { hash, previous } => restore(&mut self.inbox, hash, previous),
            JournalEntry::RollingHash { number, previous } => {
                restore(&mut self.rolling_hashes, number, previous)
            }
            JournalEntry::LastInboundMessageNumber(previous) => {
                self.last_inbound_message_number = previous
            }
            JournalEntry::InboundRollingHash { number, previous } => {
                restore(&mut self.inbound_rolling_hashes, number, previous)
            }
            JournalEntry::ClaimedWord { index, previous } => {
                restore(&mut self.claimed, index, previous)
            }
            JournalEntry::MerkleRootDepth { root, previous } => {
                restore(&mut self.merkle_roots, root, previous)
            }
            JournalEntry::MinimumFee(previous) => self.minimum_fee = previous,
            JournalEntry::RateLimit(previous) => self.rate_limit = previous,
            JournalEntry::Paused { pause_type, previous } => {
                self.paused.insert(pause_type, previous);
            }
            JournalEntry::Chunk { data_hash, previous } => {
                restore(&mut self.chunks, data_hash, previous)
            }
            JournalEntry::FinalizedState(previous) => self.finalized = previous,
            JournalEntry::StateRoot { block, previous } => {
                restore(&mut self.state_roots, block, previous)
            }
        }
    }
}

fn restore<K: Eq + Hash, V>(map: &mut HashMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

impl Transactional for MemoryDb {
    fn checkpoint(&mut self) -> Checkpoint {
        self.depth += 1;
        Checkpoint { journal_len: self.journal.len(), event_len: self.events.len() }
    }

    fn commit(&mut self, _checkpoint: Checkpoint) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        let undone = self.journal.len().saturating_sub(checkpoint.journal_len);
        while self.journal.len() > checkpoint.journal_len {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        self.events.truncate(checkpoint.event_len);
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
        trace!(target: "storage", undone, depth = self.depth, "Reverted to checkpoint");
    }
}

impl EventStorage for MemoryDb {
    fn emit(&mut self, event: BridgeEvent) {
        self.events.push(event);
    }

    fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    fn drain_events(&mut self) -> Vec<BridgeEvent> {
        debug_assert_eq!(self.depth, 0, "events drained while a checkpoint is open");
        core::mem::take(&mut self.events)
    }
}

impl MessageStorage for MemoryDb {
    fn next_message_number(&self) -> u64 {
        self.next_message_number
    }

    fn set_next_message_number(&mut self, number: u64) {
        self.record(JournalEntry::NextMessageNumber(self.next_message_number));
        self.next_message_number = number;
    }

    fn outbox_status(&self, hash: B256) -> OutboxStatus {
        self.outbox.get(&hash).copied().unwrap_or_default()
    }

    fn set_outbox_status(&mut self, hash: B256, status: OutboxStatus) {
        let previous = self.outbox.insert(hash, status);
        self.record(JournalEntry::Outbox { hash, previous });
    }

    fn inbox_status(&self, hash: B256) -> InboxStatus {
        self.inbox.get(&hash).copied().unwrap_or_default()
    }

    fn set_inbox_status(&mut self, hash: B256, status: InboxStatus) {
        let previous = self.inbox.insert(hash, status);
        self.record(JournalEntry::Inbox { hash, previous });
    }

    fn rolling_hash(&self, number: u64) -> Option<B256> {
        self.rolling_hashes.get(&number).copied()
    }

    fn set_rolling_hash(&mut self, number: u64, rolling_hash: B256) {
        let previous = self.rolling_hashes.insert(number, rolling_hash);
        self.record(JournalEntry::RollingHash { number, previous });
    }

    fn last_inbound_message_number(&self) -> u64 {
        self.last_inbound_message_number
    }

    fn set_last_inbound_message_number(&mut self, number: u64) {
        self.record(JournalEntry::LastInboundMessageNumber(self.last_inbound_message_number));
        self.last_inbound_message_number = number;
    }

    fn inbound_rolling_hash(&self, number: u64) -> Option<B256> {
        self.inbound_rolling_hashes.get(&number).copied()
    }

    fn set_inbound_rolling_hash(&mut self, number: u64, rolling_hash: B256) {
        let previous = self.inbound_rolling_hashes.insert(number, rolling_hash);
        self.record(JournalEntry::InboundRollingHash { number, previous });
    }

    fn claimed_word(&self, index: u64) -> U256 {
        self.claimed.get(&index).copied().unwrap_or_default()
    }

    fn set_claimed_word(&mut self, index: u64, word: U256) {
        let previous = self.claimed.insert(index, word);
        self.record(JournalEntry::ClaimedWord { index, previous });
    }

    fn merkle_root_depth(&self, root: B256) -> Option<u64> {
        self.merkle_roots.get(&root).copied()
    }

    fn set_merkle_root_depth(&mut self, root: B256, depth: u64) {
        let previous = self.merkle_roots.insert(root, depth);
        self.record(JournalEntry::MerkleRootDepth { root, previous });
    }

    fn minimum_fee(&self) -> U256 {
        self.minimum_fee
    }

    fn set_minimum_fee(&mut self, fee: U256) {
        self.record(JournalEntry::MinimumFee(self.minimum_fee));
        self.minimum_fee = fee;
    }
}

impl RateLimitStorage for MemoryDb {
    fn rate_limit(&self) -> RateLimitState {
        self.rate_limit
    }

    fn set_rate_limit(&mut self, state: RateLimitState) {
        self.record(JournalEntry::RateLimit(self.rate_limit));
        self.rate_limit = state;
    }
}

impl PauseStorage for MemoryDb {
    fn is_paused(&self, pause_type: PauseType) -> bool {
        self.paused.get(&pause_type).copied().unwrap_or(false)
    }

    fn set_paused(&mut self, pause_type: PauseType, paused: bool) {
        let previous = self.is_paused(pause_type);
        self.paused.insert(pause_type, paused);
        self.record(JournalEntry::Paused { pause_type, previous });
    }
}

impl RollupStorage for MemoryDb {
    fn chunk(&self, data_hash: B256) -> Option<DataChunk> {
        self.chunks.get(&data_hash).copied()
    }

    fn put_chunk(&mut self, chunk: DataChunk) {
        let data_hash = chunk.data_hash;
        let previous = self.chunks.insert(data_hash, chunk);
        self.record(JournalEntry::Chunk { data_hash, previous });
    }

    fn finalized_state(&self) -> FinalizedState {
        self.finalized
    }

    fn set_finalized_state(&mut self, state: FinalizedState) {
        self.record(JournalEntry::FinalizedState(self.finalized));
        self.finalized = state;
    }

    fn state_root(&self, block: u64) -> Option<B256> {
        self.state_roots.get(&block).copied()
    }

    fn set_state_root(&mut self, block: u64, root: B256) {
        let previous = self.state_roots.insert(block, root);
        self.record(JournalEntry::StateRoot { block, previous });
    }
}
