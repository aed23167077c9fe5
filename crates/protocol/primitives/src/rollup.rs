//! Rollup data submission and finalization records.

use alloy_primitives::{B256, Bytes};

/// A chunk of compressed execution data submitted by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SubmissionData {
    /// The data hash of the chunk this one follows. Zero when chaining from genesis.
    pub data_parent_hash: B256,
    /// The state root the chunk's first block executes on top of.
    pub parent_state_root_hash: B256,
    /// The state root after the chunk's final block.
    pub final_state_root_hash: B256,
    /// The first block covered by the chunk.
    pub first_block: u64,
    /// The final block covered by the chunk.
    pub final_block: u64,
    /// The prover's commitment to the chunk's execution trace.
    pub snark_hash: B256,
    /// The compressed execution data, a sequence of 32 byte field elements.
    pub compressed_data: Bytes,
}

/// A submitted chunk as it is recorded on the ledger.
///
/// The compressed payload itself is not retained, only its hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DataChunk {
    /// `keccak256(compressed_data)`.
    pub data_hash: B256,
    /// The data hash of the predecessor chunk.
    pub data_parent_hash: B256,
    /// The state root the chunk's first block executes on top of.
    pub parent_state_root_hash: B256,
    /// The state root after the chunk's final block.
    pub final_state_root_hash: B256,
    /// The first block covered by the chunk.
    pub first_block: u64,
    /// The final block covered by the chunk.
    pub final_block: u64,
    /// The prover's commitment to the chunk's execution trace.
    pub snark_hash: B256,
    /// The hash accumulator chaining this chunk to its predecessors.
    pub shnarf: B256,
}

/// The record an operator finalizes a range of submitted chunks with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct FinalizationData {
    /// The last finalized state root the range builds on.
    pub parent_state_root_hash: B256,
    /// The data hashes of the finalized chunks, in order.
    pub data_hashes: Vec<B256>,
    /// The data parent hash of the first chunk in `data_hashes`.
    pub data_parent_hash: B256,
    /// The block the range finalizes up to.
    pub final_block_number: u64,
    /// The timestamp of the last finalized block, as known to the operator.
    pub last_finalized_timestamp: u64,
    /// The timestamp of `final_block_number`.
    pub final_timestamp: u64,
    /// The rolling hash of this layer's outbound messages the remote layer has observed.
    pub l1_rolling_hash: B256,
    /// The message number `l1_rolling_hash` was computed at.
    pub l1_rolling_hash_message_number: u64,
    /// Roots of remote message trees to anchor.
    pub l2_merkle_roots: Vec<B256>,
    /// The depth of every tree in `l2_merkle_roots`.
    pub l2_merkle_trees_depth: u64,
    /// Packed 2 byte big-endian block offsets, relative to the previously finalized block, of the
    /// remote blocks containing messages.
    pub l2_messaging_blocks_offsets: Bytes,
}

/// The finalized head of the rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FinalizedState {
    /// The last finalized block number.
    pub last_finalized_block: u64,
    /// The timestamp of the last finalized block.
    pub last_finalized_timestamp: u64,
}
