#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod commitment;
pub use commitment::{CommitmentError, compute_x, compute_y};

mod shnarf;
pub use shnarf::ShnarfData;

mod verifier;
pub use verifier::{ProofVerifier, VerifierError, Verifiers, check_proof};

mod error;
pub use error::RollupError;

mod submission;
pub use submission::DataSubmission;

mod finalization;
pub use finalization::{BN254_SCALAR_FIELD, Finalizer, PendingProof, public_input};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
