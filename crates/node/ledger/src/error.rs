//! Errors surfaced by the [`Ledger`](crate::Ledger).

use canal_messaging::{MessagingError, RateLimitError, RegistryError};
use canal_primitives::AccessError;
use canal_rollup::RollupError;
use thiserror::Error;

/// An error returned by a ledger entry point.
///
/// A failing entry point leaves the store exactly as it found it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A role or pause check failed.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The rate limiter rejected the operation.
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    /// The message registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Sending or claiming failed.
    #[error(transparent)]
    Messaging(#[from] MessagingError),
    /// Submission or finalization failed.
    #[error(transparent)]
    Rollup(#[from] RollupError),
}

impl LedgerError {
    /// Returns whether the error is a rate limit rejection, however deeply wrapped.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::RateLimit(RateLimitError::RateLimitExceeded { .. }) |
                Self::Messaging(MessagingError::RateLimit(RateLimitError::RateLimitExceeded {
                    ..
                }))
        )
    }

    /// Returns the access error behind this error, if any.
    pub const fn access(&self) -> Option<&AccessError> {
        match self {
            Self::Access(err) |
            Self::RateLimit(RateLimitError::Access(err)) |
            Self::Registry(RegistryError::Access(err)) |
            Self::Messaging(MessagingError::Access(err)) |
            Self::Rollup(RollupError::Access(err)) => Some(err),
            _ => None,
        }
    }
}
