use crate::{CommitmentError, VerifierError};
use alloy_primitives::B256;
use canal_messaging::RegistryError;
use canal_primitives::AccessError;
use thiserror::Error;

/// Errors raised by data submission and finalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RollupError {
    /// A capability check failed.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The rolling hash claimed by the finalization record is not known.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The commitment opening could not be evaluated.
    #[error(transparent)]
    Commitment(#[from] CommitmentError),
    /// The proof verifier failed.
    #[error(transparent)]
    Verifier(#[from] VerifierError),

    /// No data was submitted.
    #[error("submission data is empty")]
    EmptySubmissionData,
    /// The final state root of a chunk is zero.
    #[error("final block state equals the zero hash")]
    FinalBlockStateEqualsZeroHash,
    /// A chunk with the same data hash was already submitted.
    #[error("data {0} was already submitted")]
    DataAlreadySubmitted(B256),
    /// The parent chunk is unknown.
    #[error("parent data {0} has an empty shnarf")]
    DataParentHasEmptyShnarf(B256),
    /// The chunk does not start from its parent's final state root.
    #[error("state root hash is invalid: expected {expected}, got {actual}")]
    StateRootHashInvalid {
        /// The parent's final state root.
        expected: B256,
        /// The chunk's parent state root.
        actual: B256,
    },
    /// The chunk does not start right after its parent's final block.
    #[error("data starting block does not match: expected {expected}, got {actual}")]
    DataStartingBlockDoesNotMatch {
        /// The block after the parent's final block.
        expected: u64,
        /// The chunk's first block.
        actual: u64,
    },
    /// The chunk starts at or before the last finalized block.
    #[error("first block {first_block} is not after the last finalized block {last_finalized_block}")]
    FirstBlockLessThanOrEqualToLastFinalizedBlock {
        /// The chunk's first block.
        first_block: u64,
        /// The last finalized block.
        last_finalized_block: u64,
    },
    /// The chunk's first block is past its final block.
    #[error("first block {first_block} is greater than final block {final_block}")]
    FirstBlockGreaterThanFinalBlock {
        /// The chunk's first block.
        first_block: u64,
        /// The chunk's final block.
        final_block: u64,
    },
    /// The computed shnarf differs from the one the submitter expected.
    #[error("final shnarf is wrong: expected {expected}, got {actual}")]
    FinalShnarfWrong {
        /// The shnarf the submitter expected.
        expected: B256,
        /// The computed shnarf.
        actual: B256,
    },

    /// The finalization record names no chunks.
    #[error("finalization data is missing")]
    FinalizationDataMissing,
    /// The record does not advance the finalized head.
    #[error("final block {final_block} is not after the last finalized block {last_finalized_block}")]
    FinalBlockNumberLessThanOrEqualToLastFinalizedBlock {
        /// The record's final block.
        final_block: u64,
        /// The last finalized block.
        last_finalized_block: u64,
    },
    /// The record's timestamps do not continue the finalized head.
    #[error("timestamps not in sequence: expected {expected}, got {actual}")]
    TimestampsNotInSequence {
        /// The timestamp the ledger expected.
        expected: u64,
        /// The timestamp the record carried.
        actual: u64,
    },
    /// The record's final timestamp is not in the past.
    #[error("finalization timestamp {final_timestamp} is not before {now}")]
    FinalizationInTheFuture {
        /// The record's final timestamp.
        final_timestamp: u64,
        /// The clock at call time.
        now: u64,
    },
    /// The first chunk's parent differs from the record's parent.
    #[error("parent hashes do not match: expected {expected}, got {actual}")]
    ParentHashesDoesNotMatch {
        /// The first chunk's recorded parent.
        expected: B256,
        /// The record's parent.
        actual: B256,
    },
    /// The parent chunk's final state root differs from the record's parent state root.
    #[error("final state root hash does not match: expected {expected}, got {actual}")]
    FinalStateRootHashDoesNotMatch {
        /// The parent chunk's final state root.
        expected: B256,
        /// The record's parent state root.
        actual: B256,
    },
    /// Consecutive chunks of the record are not parent and child.
    #[error("data hashes not in sequence: expected {expected}, got {actual}")]
    DataHashesNotInSequence {
        /// The previous data hash.
        expected: B256,
        /// The recorded parent of the next chunk.
        actual: B256,
    },
    /// The last chunk does not end at the record's final block.
    #[error("final block {actual} does not match the last chunk's final block {expected}")]
    FinalBlockDoesNotMatchShnarfFinalBlock {
        /// The last chunk's final block.
        expected: u64,
        /// The record's final block.
        actual: u64,
    },
    /// A remote tree root was already anchored.
    #[error("merkle root {0} is already anchored")]
    L2MerkleRootAlreadyAnchored(B256),
    /// The block offsets are not a whole number of 2 byte values.
    #[error("offsets length {0} is not a multiple of 2")]
    BytesLengthNotMultipleOfTwo(usize),
    /// No proof was supplied.
    #[error("proof is empty")]
    ProofIsEmpty,
    /// The record does not start from the finalized state root.
    #[error("starting root hash does not match: expected {expected}, got {actual}")]
    StartingRootHashDoesNotMatch {
        /// The state root of the last finalized block.
        expected: B256,
        /// The record's parent state root.
        actual: B256,
    },
    /// No verifier is installed at the index.
    #[error("no verifier at index {0}")]
    InvalidProofType(u8),
    /// The verifier rejected the proof.
    #[error("invalid proof")]
    InvalidProof,
}
