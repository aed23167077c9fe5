//! Finalization of submitted chunk ranges.

use crate::{RollupError, Verifiers};
use alloy_primitives::{B256, Keccak256, U256, keccak256, uint};
use alloy_sol_types::SolValue;
use canal_messaging::MessageRegistry;
use canal_primitives::{
    BridgeEvent, CallContext, DataChunk, FinalizationData, FinalizedState, PauseType, Role,
};
use canal_storage::{EventStorage, MessageStorage, PauseStorage, RollupStorage, Transactional};
use tracing::{info, warn};

/// The BN254 scalar field order. Public inputs are reduced modulo this value.
pub const BN254_SCALAR_FIELD: U256 =
    uint!(0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001_U256);

/// Advances the finalized head over a store.
#[derive(Debug)]
pub struct Finalizer<'s, S> {
    store: &'s mut S,
}

/// A validated range of chunks.
#[derive(Debug, Clone, Copy)]
struct ChunkRange {
    parent_state_root_hash: B256,
    last: DataChunk,
}

impl<'s, S> Finalizer<'s, S>
where
    S: Transactional + RollupStorage + MessageStorage + PauseStorage + EventStorage,
{
    /// Creates a finalizer over `store`.
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Finalizes the chunks named by `data` without a proof.
    pub fn finalize_without_proof(
        &mut self,
        ctx: &CallContext,
        data: &FinalizationData,
    ) -> Result<FinalizedState, RollupError> {
        let result = self.store.atomically(|store| {
            ctx.require_role(Role::DefaultAdmin)?;
            store.ensure_not_paused(PauseType::General)?;

            let previous = store.finalized_state();
            let range = validate(store, data, previous, ctx.timestamp)?;
            apply(store, data, previous, &range, false)
        });
        result.inspect_err(|err| warn!(target: "rollup::finalization", %err, "Finalization rejected"))
    }

    /// Finalizes the chunks named by `data`, gated by `proof`.
    ///
    /// The proof is checked by the verifier installed at `verifier_index` against the public
    /// input of the range.
    pub fn finalize_with_proof(
        &mut self,
        ctx: &CallContext,
        proof: &[u8],
        verifier_index: u8,
        data: &FinalizationData,
        verifiers: &Verifiers,
    ) -> Result<FinalizedState, RollupError> {
        let result = self.store.atomically(|store| {
            let pending = Finalizer::new(store).begin_with_proof(ctx, proof, data)?;
            verifiers.verify(verifier_index, proof, pending.public_input)?;
            Ok(Finalizer::new(store).complete_with_proof(&pending))
        });
        result.inspect_err(|err| {
            warn!(target: "rollup::finalization", %err, "Proof finalization rejected")
        })
    }

    /// Validates `data`, advances the finalized head and returns the public input the proof must
    /// be checked against.
    ///
    /// Writes are not grouped: the caller holds a checkpoint and reverts it unless the proof is
    /// accepted and [`Finalizer::complete_with_proof`] runs.
    pub fn begin_with_proof(
        &mut self,
        ctx: &CallContext,
        proof: &[u8],
        data: &FinalizationData,
    ) -> Result<PendingProof, RollupError> {
        ctx.require_role(Role::Operator)?;
        self.store.ensure_not_paused(PauseType::ProvingSystem)?;
        if proof.is_empty() {
            return Err(RollupError::ProofIsEmpty);
        }

        let previous = self.store.finalized_state();
        let starting_root =
            self.store.state_root(previous.last_finalized_block).unwrap_or(B256::ZERO);
        if starting_root != data.parent_state_root_hash {
            return Err(RollupError::StartingRootHashDoesNotMatch {
                expected: starting_root,
                actual: data.parent_state_root_hash,
            });
        }

        let range = validate(&mut *self.store, data, previous, ctx.timestamp)?;
        let state = apply(&mut *self.store, data, previous, &range, true)?;
        Ok(PendingProof {
            state,
            public_input: public_input(&range.last, data, previous.last_finalized_block),
            parent_state_root_hash: range.parent_state_root_hash,
            final_state_root_hash: range.last.final_state_root_hash,
        })
    }

    /// Records that the proof of `pending` was accepted.
    pub fn complete_with_proof(&mut self, pending: &PendingProof) -> FinalizedState {
        self.store.emit(BridgeEvent::BlocksVerificationDone {
            final_block: pending.state.last_finalized_block,
            parent_state_root_hash: pending.parent_state_root_hash,
            final_state_root_hash: pending.final_state_root_hash,
        });
        pending.state
    }
}

/// A finalization awaiting the verdict on its proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingProof {
    /// The finalized head once the proof is accepted.
    pub state: FinalizedState,
    /// The public input the proof is checked against.
    pub public_input: U256,
    /// The state root the range starts from.
    pub parent_state_root_hash: B256,
    /// The state root the range ends at.
    pub final_state_root_hash: B256,
}

/// Returns the public input a proof of `data` is verified against.
///
/// This is the `keccak256` of the ABI encoding of the range's final shnarf, parent and final
/// state roots, timestamps, block numbers, claimed rolling hash and its message number, the hash
/// of the packed remote tree roots, the tree depth and the hash of the block offsets, reduced
/// modulo [`BN254_SCALAR_FIELD`].
pub fn public_input(last: &DataChunk, data: &FinalizationData, last_finalized_block: u64) -> U256 {
    let mut roots = Keccak256::new();
    for root in &data.l2_merkle_roots {
        roots.update(root);
    }

    let encoded = (
        last.shnarf,
        data.parent_state_root_hash,
        last.final_state_root_hash,
        U256::from(data.last_finalized_timestamp),
        U256::from(data.final_timestamp),
        U256::from(last_finalized_block),
        U256::from(data.final_block_number),
        data.l1_rolling_hash,
        U256::from(data.l1_rolling_hash_message_number),
        roots.finalize(),
        U256::from(data.l2_merkle_trees_depth),
        keccak256(&data.l2_messaging_blocks_offsets),
    )
        .abi_encode_params();
    U256::from_be_bytes(keccak256(encoded).0).reduce_mod(BN254_SCALAR_FIELD)
}

/// Checks that `data` continues the finalized head and names a contiguous range of chunks.
///
/// Unknown data hashes read as zeroed chunks.
fn validate<S>(
    store: &mut S,
    data: &FinalizationData,
    previous: FinalizedState,
    now: u64,
) -> Result<ChunkRange, RollupError>
where
    S: RollupStorage + MessageStorage + EventStorage,
{
    let (Some(&first_hash), Some(&last_hash)) = (data.data_hashes.first(), data.data_hashes.last())
    else {
        return Err(RollupError::FinalizationDataMissing);
    };

    if data.final_block_number <= previous.last_finalized_block {
        return Err(RollupError::FinalBlockNumberLessThanOrEqualToLastFinalizedBlock {
            final_block: data.final_block_number,
            last_finalized_block: previous.last_finalized_block,
        });
    }

    MessageRegistry::new(store)
        .validate_rolling_hash(data.l1_rolling_hash_message_number, data.l1_rolling_hash)?;

    if data.last_finalized_timestamp != previous.last_finalized_timestamp {
        return Err(RollupError::TimestampsNotInSequence {
            expected: previous.last_finalized_timestamp,
            actual: data.last_finalized_timestamp,
        });
    }
    if data.final_timestamp < data.last_finalized_timestamp {
        return Err(RollupError::TimestampsNotInSequence {
            expected: data.last_finalized_timestamp,
            actual: data.final_timestamp,
        });
    }
    if data.final_timestamp >= now {
        return Err(RollupError::FinalizationInTheFuture {
            final_timestamp: data.final_timestamp,
            now,
        });
    }

    let chunk = |hash: B256| store.chunk(hash).unwrap_or_default();

    let first = chunk(first_hash);
    if first.data_parent_hash != data.data_parent_hash {
        return Err(RollupError::ParentHashesDoesNotMatch {
            expected: first.data_parent_hash,
            actual: data.data_parent_hash,
        });
    }
    let parent_state_root_hash = chunk(first.data_parent_hash).final_state_root_hash;
    if parent_state_root_hash != data.parent_state_root_hash {
        return Err(RollupError::FinalStateRootHashDoesNotMatch {
            expected: parent_state_root_hash,
            actual: data.parent_state_root_hash,
        });
    }

    for pair in data.data_hashes.windows(2) {
        let parent = chunk(pair[1]).data_parent_hash;
        if parent != pair[0] {
            return Err(RollupError::DataHashesNotInSequence { expected: pair[0], actual: parent });
        }
    }

    let last = chunk(last_hash);
    if last.final_state_root_hash == B256::ZERO {
        return Err(RollupError::FinalBlockStateEqualsZeroHash);
    }
    if last.final_block != data.final_block_number {
        return Err(RollupError::FinalBlockDoesNotMatchShnarfFinalBlock {
            expected: last.final_block,
            actual: data.final_block_number,
        });
    }

    Ok(ChunkRange { parent_state_root_hash, last })
}

/// Anchors the remote roots and block offsets of `data` and advances the finalized head.
fn apply<S>(
    store: &mut S,
    data: &FinalizationData,
    previous: FinalizedState,
    range: &ChunkRange,
    with_proof: bool,
) -> Result<FinalizedState, RollupError>
where
    S: RollupStorage + MessageStorage + EventStorage,
{
    for &root in &data.l2_merkle_roots {
        if store.merkle_root_depth(root).is_some() {
            return Err(RollupError::L2MerkleRootAlreadyAnchored(root));
        }
        store.set_merkle_root_depth(root, data.l2_merkle_trees_depth);
        store.emit(BridgeEvent::MerkleRootAnchored { root, depth: data.l2_merkle_trees_depth });
    }

    let offsets = &data.l2_messaging_blocks_offsets;
    if offsets.len() % 2 != 0 {
        return Err(RollupError::BytesLengthNotMultipleOfTwo(offsets.len()));
    }
    for offset in offsets.chunks_exact(2) {
        let block = previous.last_finalized_block + u64::from(u16::from_be_bytes([offset[0], offset[1]]));
        store.emit(BridgeEvent::MessagingBlockAnchored { block });
    }

    let state = FinalizedState {
        last_finalized_block: data.final_block_number,
        last_finalized_timestamp: data.final_timestamp,
    };
    store.set_state_root(state.last_finalized_block, range.last.final_state_root_hash);
    store.set_finalized_state(state);
    store.emit(BridgeEvent::DataFinalized {
        final_block: state.last_finalized_block,
        parent_state_root_hash: range.parent_state_root_hash,
        final_state_root_hash: range.last.final_state_root_hash,
        with_proof,
    });

    info!(
        target: "rollup::finalization",
        final_block = state.last_finalized_block,
        state_root = %range.last.final_state_root_hash,
        chunks = data.data_hashes.len(),
        with_proof,
        "Finalized blocks"
    );
    Ok(state)
}
