//! External proof verifiers, selected by index.

use crate::RollupError;
use alloy_primitives::U256;
use core::fmt;
use std::{collections::BTreeMap, rc::Rc};
use thiserror::Error;

/// An error raised by a proof verifier itself, as opposed to a rejected proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct VerifierError(pub String);

/// Verifies aggregated proofs against their public inputs.
pub trait ProofVerifier {
    /// Returns whether `proof` is valid for `public_inputs`.
    fn verify(&self, proof: &[u8], public_inputs: &[U256]) -> Result<bool, VerifierError>;
}

/// The installed verifiers, keyed by proof type.
#[derive(Default)]
pub struct Verifiers {
    slots: BTreeMap<u8, Rc<dyn ProofVerifier>>,
}

impl fmt::Debug for Verifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifiers").field("installed", &self.slots.keys()).finish()
    }
}

impl Verifiers {
    /// Creates an empty set of verifiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `verifier` for proof type `index`, replacing any previous one.
    pub fn set(&mut self, index: u8, verifier: Box<dyn ProofVerifier>) {
        self.slots.insert(index, Rc::from(verifier));
    }

    /// Removes the verifier for proof type `index`. Returns whether one was installed.
    pub fn unset(&mut self, index: u8) -> bool {
        self.slots.remove(&index).is_some()
    }

    /// Returns whether a verifier is installed for proof type `index`.
    pub fn contains(&self, index: u8) -> bool {
        self.slots.contains_key(&index)
    }

    /// Returns a handle to the verifier of proof type `index`.
    ///
    /// The handle outlives any borrow of `self`, so the verifier can run while the set is
    /// modified.
    pub fn get(&self, index: u8) -> Result<Rc<dyn ProofVerifier>, RollupError> {
        self.slots.get(&index).cloned().ok_or(RollupError::InvalidProofType(index))
    }

    /// Verifies `proof` with the verifier of proof type `index`.
    ///
    /// Fails with [`RollupError::InvalidProofType`] if none is installed. See [`check_proof`].
    pub fn verify(&self, index: u8, proof: &[u8], public_input: U256) -> Result<(), RollupError> {
        check_proof(&*self.get(index)?, proof, public_input)
    }
}

/// Checks `proof` against `public_input` with `verifier`.
///
/// Fails with [`RollupError::InvalidProof`] if the verifier rejects the proof. Errors of the
/// verifier itself are passed through.
pub fn check_proof(
    verifier: &dyn ProofVerifier,
    proof: &[u8],
    public_input: U256,
) -> Result<(), RollupError> {
    if verifier.verify(proof, &[public_input])? { Ok(()) } else { Err(RollupError::InvalidProof) }
}
