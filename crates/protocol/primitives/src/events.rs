//! Notifications emitted by committed ledger operations.

use crate::PauseType;
use alloy_primitives::{Address, B256, Bytes, U256};

/// A notification emitted by the ledger.
///
/// Events are only observable once the operation that emitted them commits; a failing
/// operation leaves no events behind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "camelCase"))]
pub enum BridgeEvent {
    /// A message was sent to the remote layer.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MessageSent {
        /// The sender.
        sender: Address,
        /// The recipient on the remote layer.
        recipient: Address,
        /// The claiming fee.
        fee: U256,
        /// The value transferred on delivery.
        value: U256,
        /// The assigned message number.
        number: u64,
        /// The call data.
        calldata: Bytes,
        /// The message hash.
        hash: B256,
    },
    /// An inbound message was claimed.
    MessageClaimed {
        /// The message hash.
        hash: B256,
    },
    /// The outbound rolling hash advanced.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    RollingHashUpdated {
        /// The message number the rolling hash was computed at.
        number: u64,
        /// The new rolling hash.
        rolling_hash: B256,
        /// The message hash folded in.
        message_hash: B256,
    },
    /// The remote layer acknowledged delivery of outbound messages.
    MessagesAcknowledged {
        /// The acknowledged hashes.
        hashes: Vec<B256>,
    },
    /// Inbound message hashes became claimable.
    MessageHashesAddedToInbox {
        /// The inserted hashes.
        hashes: Vec<B256>,
    },
    /// The inbound rolling hash advanced.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    InboundRollingHashUpdated {
        /// The last inbound message number.
        number: u64,
        /// The inbound rolling hash at `number`.
        rolling_hash: B256,
    },
    /// A data chunk was submitted.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    DataSubmitted {
        /// The chunk's data hash.
        data_hash: B256,
        /// The first block of the chunk.
        first_block: u64,
        /// The final block of the chunk.
        final_block: u64,
    },
    /// A range of chunks was finalized.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    DataFinalized {
        /// The new last finalized block.
        final_block: u64,
        /// The state root the range started from.
        parent_state_root_hash: B256,
        /// The state root at `final_block`.
        final_state_root_hash: B256,
        /// Whether the range was proven.
        with_proof: bool,
    },
    /// A proof for a finalized range was verified.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    BlocksVerificationDone {
        /// The new last finalized block.
        final_block: u64,
        /// The state root the range started from.
        parent_state_root_hash: B256,
        /// The state root at `final_block`.
        final_state_root_hash: B256,
    },
    /// A remote message tree root was anchored.
    MerkleRootAnchored {
        /// The tree root.
        root: B256,
        /// The tree depth.
        depth: u64,
    },
    /// A remote block containing messages was anchored.
    MessagingBlockAnchored {
        /// The remote block number.
        block: u64,
    },
    /// The rate limit changed.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    LimitAmountChanged {
        /// The account that changed the limit.
        caller: Address,
        /// The new limit.
        limit: U256,
        /// Whether the used amount was reset because the period had elapsed.
        used_amount_reset_to_zero: bool,
    },
    /// The used amount of the current period was reset.
    AmountUsedInPeriodReset {
        /// The account that reset the amount.
        caller: Address,
    },
    /// A pause flag was set.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Paused {
        /// The account that paused.
        caller: Address,
        /// The flag that was set.
        pause_type: PauseType,
    },
    /// A pause flag was cleared.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Unpaused {
        /// The account that unpaused.
        caller: Address,
        /// The flag that was cleared.
        pause_type: PauseType,
    },
    /// A proof verifier was set or removed.
    VerifierChanged {
        /// The account that changed the verifier.
        caller: Address,
        /// The verifier index.
        index: u8,
        /// Whether a verifier is now installed at `index`.
        installed: bool,
    },
    /// The minimum message fee changed.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    MinimumFeeChanged {
        /// The account that changed the fee.
        caller: Address,
        /// The previous minimum fee.
        previous_fee: U256,
        /// The new minimum fee.
        new_fee: U256,
    },
}

impl BridgeEvent {
    /// Returns the event's name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MessageSent { .. } => "MessageSent",
            Self::MessageClaimed { .. } => "MessageClaimed",
            Self::RollingHashUpdated { .. } => "RollingHashUpdated",
            Self::MessagesAcknowledged { .. } => "MessagesAcknowledged",
            Self::MessageHashesAddedToInbox { .. } => "MessageHashesAddedToInbox",
            Self::InboundRollingHashUpdated { .. } => "InboundRollingHashUpdated",
            Self::DataSubmitted { .. } => "DataSubmitted",
            Self::DataFinalized { .. } => "DataFinalized",
            Self::BlocksVerificationDone { .. } => "BlocksVerificationDone",
            Self::MerkleRootAnchored { .. } => "MerkleRootAnchored",
            Self::MessagingBlockAnchored { .. } => "MessagingBlockAnchored",
            Self::LimitAmountChanged { .. } => "LimitAmountChanged",
            Self::AmountUsedInPeriodReset { .. } => "AmountUsedInPeriodReset",
            Self::Paused { .. } => "Paused",
            Self::Unpaused { .. } => "Unpaused",
            Self::VerifierChanged { .. } => "VerifierChanged",
            Self::MinimumFeeChanged { .. } => "MinimumFeeChanged",
        }
    }
}
