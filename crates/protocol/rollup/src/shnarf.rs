//! The shnarf: the hash chaining every submitted chunk to its parent.

use alloy_primitives::{B256, Keccak256};

/// The inputs of a chunk's shnarf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShnarfData {
    /// The shnarf of the parent chunk.
    pub parent_shnarf: B256,
    /// The `keccak256` of the chunk's compressed data.
    pub data_hash: B256,
    /// The snark hash of the chunk.
    pub snark_hash: B256,
    /// The state root at the chunk's final block.
    pub final_state_root_hash: B256,
    /// The commitment opening of the chunk's data.
    pub commitment_y: B256,
}

impl ShnarfData {
    /// The shnarf inputs of the genesis pseudo-chunk.
    pub const fn genesis(initial_state_root: B256) -> Self {
        Self {
            parent_shnarf: B256::ZERO,
            data_hash: B256::ZERO,
            snark_hash: B256::ZERO,
            final_state_root_hash: initial_state_root,
            commitment_y: B256::ZERO,
        }
    }

    /// Returns
    /// `keccak256(parent_shnarf ‖ data_hash ‖ snark_hash ‖ final_state_root_hash ‖ commitment_y)`.
    pub fn hash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.parent_shnarf);
        hasher.update(self.data_hash);
        hasher.update(self.snark_hash);
        hasher.update(self.final_state_root_hash);
        hasher.update(self.commitment_y);
        hasher.finalize()
    }
}
