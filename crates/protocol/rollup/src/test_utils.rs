//! Test utilities for the rollup.

use crate::{ProofVerifier, VerifierError};
use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use canal_primitives::{CallContext, Role, SubmissionData};
use core::cell::RefCell;
use std::rc::Rc;

/// A [`ProofVerifier`] with a fixed outcome that records the public inputs it was called with.
#[derive(Debug, Clone)]
pub struct MockVerifier {
    outcome: Result<bool, VerifierError>,
    calls: Rc<RefCell<Vec<Vec<U256>>>>,
}

impl MockVerifier {
    /// A verifier accepting every proof.
    pub fn accepting() -> Self {
        Self::with_outcome(Ok(true))
    }

    /// A verifier rejecting every proof.
    pub fn rejecting() -> Self {
        Self::with_outcome(Ok(false))
    }

    /// A verifier failing with `reason`.
    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(Err(VerifierError(reason.to_string())))
    }

    fn with_outcome(outcome: Result<bool, VerifierError>) -> Self {
        Self { outcome, calls: Rc::default() }
    }

    /// Returns the public inputs of every call so far. Clones share the record.
    pub fn calls(&self) -> Vec<Vec<U256>> {
        self.calls.borrow().clone()
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, _proof: &[u8], public_inputs: &[U256]) -> Result<bool, VerifierError> {
        self.calls.borrow_mut().push(public_inputs.to_vec());
        self.outcome.clone()
    }
}

/// Returns a context holding the operator role.
pub fn operator() -> CallContext {
    CallContext::new(Address::repeat_byte(0x0e), 0).with_role(Role::Operator)
}

/// Builds a well-formed chunk over blocks `first_block..=final_block` whose content is derived
/// from `seed`.
///
/// The final state root is `0x5eed..` followed by the seed, so distinct seeds give distinct
/// chunks.
pub fn chunk_data(
    data_parent_hash: B256,
    parent_state_root_hash: B256,
    first_block: u64,
    final_block: u64,
    seed: u8,
) -> SubmissionData {
    let mut compressed = vec![0u8; 64];
    compressed[1..32].fill(seed);
    compressed[33..].fill(seed.wrapping_add(1));

    let mut final_state_root_hash = B256::repeat_byte(seed);
    final_state_root_hash[..2].copy_from_slice(&[0x5e, 0xed]);

    SubmissionData {
        data_parent_hash,
        parent_state_root_hash,
        final_state_root_hash,
        first_block,
        final_block,
        snark_hash: keccak256([seed]),
        compressed_data: Bytes::from(compressed),
    }
}
