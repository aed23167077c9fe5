//! Intake of compressed data chunks.

use crate::{RollupError, ShnarfData, compute_x, compute_y};
use alloy_primitives::{B256, keccak256};
use canal_primitives::{
    BridgeEvent, CallContext, DataChunk, FinalizedState, PauseType, Role, SubmissionData,
};
use canal_storage::{EventStorage, PauseStorage, RollupStorage, Transactional};
use tracing::{debug, warn};

/// Records genesis and accepts submitted chunks over a store.
#[derive(Debug)]
pub struct DataSubmission<'s, S> {
    store: &'s mut S,
}

impl<'s, S> DataSubmission<'s, S>
where
    S: Transactional + RollupStorage + PauseStorage + EventStorage,
{
    /// Creates a submission handler over `store`.
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Stores the genesis pseudo-chunk under the zero data hash and seeds the finalized head.
    pub fn initialize(
        &mut self,
        initial_state_root: B256,
        initial_block: u64,
        initial_timestamp: u64,
    ) {
        let chunk = DataChunk {
            data_hash: B256::ZERO,
            final_state_root_hash: initial_state_root,
            final_block: initial_block,
            shnarf: ShnarfData::genesis(initial_state_root).hash(),
            ..Default::default()
        };
        self.store.put_chunk(chunk);
        self.store.set_state_root(initial_block, initial_state_root);
        self.store.set_finalized_state(FinalizedState {
            last_finalized_block: initial_block,
            last_finalized_timestamp: initial_timestamp,
        });
    }

    /// Submits one chunk.
    ///
    /// If `expected_shnarf` is given, the chunk is only accepted when its computed shnarf
    /// matches it.
    pub fn submit(
        &mut self,
        ctx: &CallContext,
        data: &SubmissionData,
        expected_shnarf: Option<B256>,
    ) -> Result<DataChunk, RollupError> {
        self.store
            .atomically(|store| submit_chunk(store, ctx, data, expected_shnarf))
            .inspect_err(|err| warn!(target: "rollup::submission", %err, "Submission rejected"))
    }

    /// Submits `chunks` in order, all or none.
    ///
    /// If `expected_shnarf` is given, the batch is only accepted when the shnarf of its last
    /// chunk matches it.
    pub fn submit_batch(
        &mut self,
        ctx: &CallContext,
        chunks: &[SubmissionData],
        expected_shnarf: Option<B256>,
    ) -> Result<Vec<DataChunk>, RollupError> {
        let result = self.store.atomically(|store| {
            let Some((last, rest)) = chunks.split_last() else {
                return Err(RollupError::EmptySubmissionData);
            };
            let mut submitted = rest
                .iter()
                .map(|data| submit_chunk(store, ctx, data, None))
                .collect::<Result<Vec<_>, _>>()?;
            submitted.push(submit_chunk(store, ctx, last, expected_shnarf)?);
            Ok(submitted)
        });
        result.inspect_err(|err| warn!(target: "rollup::submission", %err, "Batch rejected"))
    }
}

fn submit_chunk<S>(
    store: &mut S,
    ctx: &CallContext,
    data: &SubmissionData,
    expected_shnarf: Option<B256>,
) -> Result<DataChunk, RollupError>
where
    S: RollupStorage + PauseStorage + EventStorage,
{
    ctx.require_role(Role::Operator)?;
    store.ensure_not_paused(PauseType::General)?;

    if data.compressed_data.is_empty() {
        return Err(RollupError::EmptySubmissionData);
    }
    if data.final_state_root_hash == B256::ZERO {
        return Err(RollupError::FinalBlockStateEqualsZeroHash);
    }

    let data_hash = keccak256(&data.compressed_data);
    if store.chunk(data_hash).is_some() {
        return Err(RollupError::DataAlreadySubmitted(data_hash));
    }

    let parent = store
        .chunk(data.data_parent_hash)
        .ok_or(RollupError::DataParentHasEmptyShnarf(data.data_parent_hash))?;
    // Chunks on the genesis parent are only bounded by the last finalized block.
    if data.data_parent_hash != B256::ZERO {
        if parent.final_state_root_hash != data.parent_state_root_hash {
            return Err(RollupError::StateRootHashInvalid {
                expected: parent.final_state_root_hash,
                actual: data.parent_state_root_hash,
            });
        }
        if parent.final_block + 1 != data.first_block {
            return Err(RollupError::DataStartingBlockDoesNotMatch {
                expected: parent.final_block + 1,
                actual: data.first_block,
            });
        }
    }

    let last_finalized_block = store.finalized_state().last_finalized_block;
    if data.first_block <= last_finalized_block {
        return Err(RollupError::FirstBlockLessThanOrEqualToLastFinalizedBlock {
            first_block: data.first_block,
            last_finalized_block,
        });
    }
    if data.first_block > data.final_block {
        return Err(RollupError::FirstBlockGreaterThanFinalBlock {
            first_block: data.first_block,
            final_block: data.final_block,
        });
    }

    let x = compute_x(data.snark_hash, data_hash);
    let commitment_y = compute_y(&data.compressed_data, x)?;
    let shnarf = ShnarfData {
        parent_shnarf: parent.shnarf,
        data_hash,
        snark_hash: data.snark_hash,
        final_state_root_hash: data.final_state_root_hash,
        commitment_y,
    }
    .hash();
    if let Some(expected) = expected_shnarf.filter(|expected| *expected != shnarf) {
        return Err(RollupError::FinalShnarfWrong { expected, actual: shnarf });
    }

    let chunk = DataChunk {
        data_hash,
        data_parent_hash: data.data_parent_hash,
        parent_state_root_hash: data.parent_state_root_hash,
        final_state_root_hash: data.final_state_root_hash,
        first_block: data.first_block,
        final_block: data.final_block,
        snark_hash: data.snark_hash,
        shnarf,
    };
    store.put_chunk(chunk);
    store.emit(BridgeEvent::DataSubmitted {
        data_hash,
        first_block: data.first_block,
        final_block: data.final_block,
    });

    debug!(
        target: "rollup::submission",
        %data_hash,
        first_block = data.first_block,
        final_block = data.final_block,
        %shnarf,
        "Accepted chunk"
    );
    Ok(chunk)
}
