//! The seam between the bridge and whatever executes calls on the destination layer.

use alloy_primitives::{Address, Bytes, U256};
use thiserror::Error;

/// A call delivering a message to its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryCall<'a> {
    /// The original sender of the message, exposed to the recipient for the duration of the
    /// call.
    pub sender: Address,
    /// The recipient.
    pub recipient: Address,
    /// The value transferred with the call.
    pub value: U256,
    /// The call data executed against the recipient.
    pub calldata: &'a Bytes,
}

/// A failed call or transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The callee reverted, with the reason it gave.
    #[error("call reverted: {0}")]
    Reverted(String),
    /// The transfer could not be funded.
    #[error("insufficient balance: {available} available, {required} required")]
    InsufficientBalance {
        /// The balance available.
        available: U256,
        /// The amount required.
        required: U256,
    },
}

/// Executes message deliveries and value transfers on the destination layer.
///
/// Implementations may call back into the ledger from [`Executor::deliver`]. The executor shares
/// the store's checkpoint contract: everything done after [`Executor::checkpoint`] is undone by
/// [`Executor::revert`] and kept by [`Executor::commit`], so a delivery and the fee payment that
/// follows it form one unit.
pub trait Executor {
    /// A position in the executor's own journal.
    type Checkpoint: Copy;

    /// Transfers `call.value` to `call.recipient` and executes `call.calldata` against it.
    fn deliver(&self, call: DeliveryCall<'_>) -> Result<(), ExecutionError>;

    /// Transfers `amount` to `recipient` without executing anything.
    fn transfer(&self, recipient: Address, amount: U256) -> Result<(), ExecutionError>;

    /// Opens a checkpoint.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Keeps everything done since `checkpoint`.
    fn commit(&self, checkpoint: Self::Checkpoint);

    /// Undoes everything done since `checkpoint`.
    fn revert(&self, checkpoint: Self::Checkpoint);
}
