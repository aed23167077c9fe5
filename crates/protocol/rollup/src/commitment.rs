//! Evaluation of a chunk's polynomial commitment opening.
//!
//! The compressed data of a chunk is read as the coefficients of a polynomial over the BLS12-381
//! scalar field, one 32 byte big-endian element per coefficient. The chunk commits to the value
//! of that polynomial at a point derived from its data and snark hashes.

use alloy_primitives::B256;
use ark_bls12_381::Fr;
use ark_ff::{BigInteger, PrimeField};
use canal_primitives::hash_pair;
use thiserror::Error;

/// Errors raised while evaluating a commitment opening.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    /// The data is not a whole number of 32 byte elements.
    #[error("data length {0} is not a multiple of 32")]
    BytesLengthNotMultipleOf32(usize),
    /// An element does not fit the scalar field.
    #[error("first byte of element {0} is not zero")]
    FirstByteIsNotZero(usize),
}

/// Returns the evaluation point of a chunk: `keccak256(snark_hash ‖ data_hash)`.
pub fn compute_x(snark_hash: B256, data_hash: B256) -> B256 {
    hash_pair(snark_hash, data_hash)
}

/// Evaluates the polynomial with coefficients `data` at `x`, modulo the BLS12-381 scalar field
/// order.
///
/// Element `i` is the coefficient of `x^i`. Every element must have a zero first byte.
pub fn compute_y(data: &[u8], x: B256) -> Result<B256, CommitmentError> {
    if data.len() % 32 != 0 {
        return Err(CommitmentError::BytesLengthNotMultipleOf32(data.len()));
    }
    if let Some(index) = data.chunks_exact(32).position(|element| element[0] != 0) {
        return Err(CommitmentError::FirstByteIsNotZero(index));
    }

    let x = Fr::from_be_bytes_mod_order(x.as_slice());
    let y = data
        .chunks_exact(32)
        .rev()
        .fold(Fr::from(0u64), |y, element| y * x + Fr::from_be_bytes_mod_order(element));
    Ok(B256::from_slice(&y.into_bigint().to_bytes_be()))
}
