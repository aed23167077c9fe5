//! Merkle inclusion proofs against anchored remote message trees.

use alloy_primitives::B256;
use canal_primitives::{Message, hash_pair};
use canal_storage::MessageStorage;
use thiserror::Error;

/// The deepest tree a leaf index can address.
pub const MAX_TREE_DEPTH: usize = 32;

/// Errors raised while verifying or building message trees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// The root was never anchored.
    #[error("merkle root {0} does not exist")]
    L2MerkleRootDoesNotExist(B256),
    /// The proof length differs from the anchored tree depth.
    #[error("proof length {proof_length} differs from merkle depth {depth}")]
    ProofLengthDifferentThanMerkleDepth {
        /// The anchored depth.
        depth: u64,
        /// The length of the supplied proof.
        proof_length: usize,
    },
    /// The leaf index addresses a leaf outside the tree.
    #[error("leaf index {leaf_index} is out of bounds for depth {depth}")]
    LeafIndexOutOfBounds {
        /// The supplied leaf index.
        leaf_index: u32,
        /// The tree depth.
        depth: usize,
    },
    /// More leaves were supplied than the tree can hold.
    #[error("{leaves} leaves do not fit in a tree of depth {depth}")]
    TooManyLeaves {
        /// The number of leaves.
        leaves: usize,
        /// The tree depth.
        depth: usize,
    },
}

/// Checks message inclusion against the remote tree roots anchored in a store.
#[derive(Debug)]
pub struct MerkleClaimVerifier<'s, S> {
    store: &'s S,
}

impl<'s, S: MessageStorage> MerkleClaimVerifier<'s, S> {
    /// Creates a verifier over `store`.
    pub const fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Returns whether `message` sits at `leaf_index` of the anchored tree `root`.
    ///
    /// Fails if `root` is not anchored or the proof does not match the anchored depth.
    pub fn verify(
        &self,
        message: &Message,
        proof: &[B256],
        leaf_index: u32,
        root: B256,
    ) -> Result<bool, MerkleError> {
        let depth =
            self.store.merkle_root_depth(root).ok_or(MerkleError::L2MerkleRootDoesNotExist(root))?;
        if proof.len() as u64 != depth {
            return Err(MerkleError::ProofLengthDifferentThanMerkleDepth {
                depth,
                proof_length: proof.len(),
            });
        }
        verify_merkle_proof(message.hash(), proof, leaf_index, root)
    }
}

/// Folds `leaf` up through `proof` and compares the result with `root`.
///
/// At height `h`, the node is hashed as the right child when bit `h` of `leaf_index` is set and
/// as the left child otherwise.
pub fn verify_merkle_proof(
    leaf: B256,
    proof: &[B256],
    leaf_index: u32,
    root: B256,
) -> Result<bool, MerkleError> {
    let depth = proof.len();
    if depth < MAX_TREE_DEPTH && u64::from(leaf_index) >= 1u64 << depth {
        return Err(MerkleError::LeafIndexOutOfBounds { leaf_index, depth });
    }

    let node = proof.iter().enumerate().fold(leaf, |node, (height, sibling)| {
        if height < MAX_TREE_DEPTH && (leaf_index >> height) & 1 == 1 {
            hash_pair(*sibling, node)
        } else {
            hash_pair(node, *sibling)
        }
    });
    Ok(node == root)
}

/// A fixed-depth binary tree over message hashes.
///
/// Missing leaves are zero. Only the populated part of each layer is materialized; empty subtrees
/// are represented by their precomputed hashes, so deep trees over few leaves stay cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<B256>>,
    empty: Vec<B256>,
}

impl MerkleTree {
    /// Builds a tree of `depth` over `leaves`.
    pub fn new(leaves: Vec<B256>, depth: usize) -> Result<Self, MerkleError> {
        if depth > MAX_TREE_DEPTH || leaves.len() as u64 > 1u64 << depth {
            return Err(MerkleError::TooManyLeaves { leaves: leaves.len(), depth });
        }

        let mut empty = Vec::with_capacity(depth + 1);
        empty.push(B256::ZERO);
        for height in 0..depth {
            empty.push(hash_pair(empty[height], empty[height]));
        }

        let mut layers = Vec::with_capacity(depth + 1);
        layers.push(leaves);
        for height in 0..depth {
            let next = layers[height]
                .chunks(2)
                .map(|pair| hash_pair(pair[0], pair.get(1).copied().unwrap_or(empty[height])))
                .collect();
            layers.push(next);
        }

        Ok(Self { layers, empty })
    }

    /// Returns the depth of the tree.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Returns the root of the tree.
    pub fn root(&self) -> B256 {
        let depth = self.depth();
        self.layers[depth].first().copied().unwrap_or(self.empty[depth])
    }

    /// Returns the sibling path of the leaf at `index`, or [`None`] if `index` is outside the
    /// tree.
    pub fn proof(&self, index: u32) -> Option<Vec<B256>> {
        let depth = self.depth();
        if depth < MAX_TREE_DEPTH && u64::from(index) >= 1u64 << depth {
            return None;
        }

        let mut position = index as usize;
        let proof = (0..depth)
            .map(|height| {
                let sibling = self.layers[height].get(position ^ 1).copied();
                position >>= 1;
                sibling.unwrap_or(self.empty[height])
            })
            .collect();
        Some(proof)
    }
}
