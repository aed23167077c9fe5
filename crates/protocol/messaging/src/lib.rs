#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod rate_limit;
pub use rate_limit::{RateLimitError, RateLimiter};

mod registry;
pub use registry::{MAX_MESSAGE_HASHES, MessageRegistry, RegistryError, is_number_claimed};

mod merkle;
pub use merkle::{MAX_TREE_DEPTH, MerkleClaimVerifier, MerkleError, MerkleTree, verify_merkle_proof};

mod guard;
pub use guard::{Entered, ReentrancyGuard};

mod executor;
pub use executor::{DeliveryCall, ExecutionError, Executor};

mod fees;
pub use fees::{FeePolicy, FeeSplit};

mod error;
pub use error::MessagingError;

mod service;
pub use service::{ClaimProof, MessageService};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
