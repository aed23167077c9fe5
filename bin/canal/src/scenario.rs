//! The JSON scenario format replayed by the `replay` subcommand.

use crate::runtime::DevVerifier;
use alloy_primitives::{Address, B256, Bytes, U256};
use canal_ledger::{Ledger, LedgerError};
use canal_messaging::{ClaimProof, Executor};
use canal_primitives::{CallContext, FinalizationData, Message, PauseType, SubmissionData};
use canal_storage::LedgerStorage;
use serde::Deserialize;

/// A sequence of operations, each run with its own capability context.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Accounts whose incoming deliveries and transfers fail.
    #[serde(default)]
    pub rejecting_accounts: Vec<Address>,
    /// The steps, in order.
    pub steps: Vec<Step>,
}

/// One step of a [`Scenario`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    /// The caller, attached value, clock and roles of the call.
    #[serde(default)]
    pub context: CallContext,
    /// The ledger entry point to call.
    pub operation: Operation,
}

/// A ledger entry point and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Sends a message to the remote layer.
    Send {
        /// The recipient on the remote layer.
        recipient: Address,
        /// The claiming fee, deducted from the attached value.
        #[serde(default)]
        fee: U256,
        /// The call data.
        #[serde(default)]
        calldata: Bytes,
    },
    /// Claims an inbound message made claimable by hash.
    Claim {
        /// The claimed message.
        message: Message,
        /// The fee recipient, or zero to pay the caller.
        #[serde(default)]
        fee_recipient: Address,
    },
    /// Claims an inbound message with a Merkle proof.
    ClaimWithProof {
        /// The claimed message.
        message: Message,
        /// The sibling path from the leaf to the root.
        proof: Vec<B256>,
        /// The leaf position.
        leaf_index: u32,
        /// The anchored root.
        root: B256,
        /// The fee recipient, or zero to pay the caller.
        #[serde(default)]
        fee_recipient: Address,
    },
    /// Makes one inbound message claimable.
    MarkDeliverable {
        /// The message hash.
        hash: B256,
    },
    /// Anchors a batch of inbound message hashes.
    AnchorMessageHashes {
        /// The hashes.
        hashes: Vec<B256>,
        /// The number of the first hash.
        start_number: u64,
        /// The expected last message number.
        final_number: u64,
        /// The expected inbound rolling hash at `final_number`.
        final_rolling_hash: B256,
    },
    /// Acknowledges delivery of outbound messages.
    AcknowledgeDelivered {
        /// The hashes.
        hashes: Vec<B256>,
    },
    /// Submits one data chunk.
    Submit {
        /// The chunk.
        data: SubmissionData,
        /// The shnarf the chunk must produce.
        #[serde(default)]
        expected_shnarf: Option<B256>,
    },
    /// Submits several data chunks at once.
    SubmitBatch {
        /// The chunks.
        chunks: Vec<SubmissionData>,
        /// The shnarf the last chunk must produce.
        #[serde(default)]
        expected_shnarf: Option<B256>,
    },
    /// Finalizes without a proof.
    FinalizeWithoutProof {
        /// The finalization record.
        data: FinalizationData,
    },
    /// Finalizes with a proof.
    FinalizeWithProof {
        /// The proof.
        proof: Bytes,
        /// The verifier to check the proof with.
        #[serde(default)]
        verifier_index: u8,
        /// The finalization record.
        data: FinalizationData,
    },
    /// Installs a development verifier.
    SetVerifier {
        /// The proof type.
        index: u8,
        /// Whether the verifier accepts every proof.
        #[serde(default = "default_accept")]
        accept: bool,
    },
    /// Removes a verifier.
    UnsetVerifier {
        /// The proof type.
        index: u8,
    },
    /// Sets a pause flag.
    Pause {
        /// The flag.
        pause_type: PauseType,
    },
    /// Clears a pause flag.
    Unpause {
        /// The flag.
        pause_type: PauseType,
    },
    /// Changes the rate limit.
    SetRateLimit {
        /// The new limit.
        limit: U256,
    },
    /// Resets the amount used in the current period.
    ResetRateLimitUsed,
    /// Changes the minimum message fee.
    SetMinimumFee {
        /// The new minimum fee.
        fee: U256,
    },
}

const fn default_accept() -> bool {
    true
}

impl Operation {
    /// Returns the name of the entry point.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::Claim { .. } => "claim",
            Self::ClaimWithProof { .. } => "claimWithProof",
            Self::MarkDeliverable { .. } => "markDeliverable",
            Self::AnchorMessageHashes { .. } => "anchorMessageHashes",
            Self::AcknowledgeDelivered { .. } => "acknowledgeDelivered",
            Self::Submit { .. } => "submit",
            Self::SubmitBatch { .. } => "submitBatch",
            Self::FinalizeWithoutProof { .. } => "finalizeWithoutProof",
            Self::FinalizeWithProof { .. } => "finalizeWithProof",
            Self::SetVerifier { .. } => "setVerifier",
            Self::UnsetVerifier { .. } => "unsetVerifier",
            Self::Pause { .. } => "pause",
            Self::Unpause { .. } => "unpause",
            Self::SetRateLimit { .. } => "setRateLimit",
            Self::ResetRateLimitUsed => "resetRateLimitUsed",
            Self::SetMinimumFee { .. } => "setMinimumFee",
        }
    }

    /// Calls the entry point on `ledger` with `ctx`.
    pub fn apply<S, X>(&self, ledger: &Ledger<S, X>, ctx: &CallContext) -> Result<(), LedgerError>
    where
        S: LedgerStorage,
        X: Executor,
    {
        match self {
            Self::Send { recipient, fee, calldata } => {
                ledger.send(ctx, *recipient, *fee, calldata.clone()).map(drop)
            }
            Self::Claim { message, fee_recipient } => {
                ledger.claim(ctx, message, *fee_recipient).map(drop)
            }
            Self::ClaimWithProof { message, proof, leaf_index, root, fee_recipient } => {
                let claim = ClaimProof {
                    message: message.clone(),
                    proof: proof.clone(),
                    leaf_index: *leaf_index,
                    root: *root,
                    fee_recipient: *fee_recipient,
                };
                ledger.claim_with_proof(ctx, &claim).map(drop)
            }
            Self::MarkDeliverable { hash } => ledger.mark_deliverable(ctx, *hash),
            Self::AnchorMessageHashes { hashes, start_number, final_number, final_rolling_hash } => {
                ledger.anchor_message_hashes(
                    ctx,
                    hashes,
                    *start_number,
                    *final_number,
                    *final_rolling_hash,
                )
            }
            Self::AcknowledgeDelivered { hashes } => ledger.acknowledge_delivered(ctx, hashes),
            Self::Submit { data, expected_shnarf } => {
                ledger.submit(ctx, data, *expected_shnarf).map(drop)
            }
            Self::SubmitBatch { chunks, expected_shnarf } => {
                ledger.submit_batch(ctx, chunks, *expected_shnarf).map(drop)
            }
            Self::FinalizeWithoutProof { data } => ledger.finalize_without_proof(ctx, data).map(drop),
            Self::FinalizeWithProof { proof, verifier_index, data } => {
                ledger.finalize_with_proof(ctx, proof, *verifier_index, data).map(drop)
            }
            Self::SetVerifier { index, accept } => {
                ledger.set_verifier(ctx, *index, Box::new(DevVerifier::new(*accept)))
            }
            Self::UnsetVerifier { index } => ledger.unset_verifier(ctx, *index),
            Self::Pause { pause_type } => ledger.pause(ctx, *pause_type),
            Self::Unpause { pause_type } => ledger.unpause(ctx, *pause_type),
            Self::SetRateLimit { limit } => ledger.set_rate_limit(ctx, *limit),
            Self::ResetRateLimitUsed => ledger.reset_rate_limit_used(ctx),
            Self::SetMinimumFee { fee } => ledger.set_minimum_fee(ctx, *fee),
        }
    }
}
