use crate::{ExecutionError, MerkleError, RateLimitError, RegistryError};
use alloy_primitives::{Address, U256};
use canal_primitives::AccessError;
use thiserror::Error;

/// Errors raised by the [`MessageService`](crate::MessageService).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// A capability check failed.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The rate limiter rejected the value.
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    /// The registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The Merkle proof could not be checked.
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    /// The recipient is the zero address.
    #[error("zero address is not allowed")]
    ZeroAddressNotAllowed,
    /// The attached value does not cover the fee.
    #[error("value {value} is lower than fee {fee}")]
    ValueSentTooLow {
        /// The attached value.
        value: U256,
        /// The fee.
        fee: U256,
    },
    /// The fee is below the configured minimum.
    #[error("fee {fee} is lower than the minimum fee {minimum}")]
    FeeTooLow {
        /// The fee.
        fee: U256,
        /// The minimum fee.
        minimum: U256,
    },
    /// The Merkle proof does not lead to the claimed root.
    #[error("invalid merkle proof")]
    InvalidMerkleProof,
    /// A claim was entered while another claim was delivering.
    #[error("reentrant call")]
    ReentrantCall,
    /// Delivering the message to its recipient failed.
    #[error("message delivery to {recipient} failed: {reason}")]
    MessageSendingFailed {
        /// The recipient.
        recipient: Address,
        /// Why delivery failed.
        #[source]
        reason: ExecutionError,
    },
    /// Paying the fee or the refund failed.
    #[error("fee payment to {recipient} failed: {reason}")]
    FeePaymentFailed {
        /// The account that should have been paid.
        recipient: Address,
        /// Why the payment failed.
        #[source]
        reason: ExecutionError,
    },
}
