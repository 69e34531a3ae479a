use rxl_types::{Block, ParentRef};

use crate::hasher::BlockHasher;

/// Hash chain integrity verifier.
///
/// Verifies that a sequence of blocks forms a valid hash chain: each block's
/// hash is correctly computed from its own stored fields, and each block's
/// `previous_hash` matches the stored hash of the block before it.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify the links of a chain, starting after genesis.
    ///
    /// For every block from index 1 to the end:
    /// 1. The stored hash equals the hash recomputed from its fields
    /// 2. `previous_hash` equals the prior block's stored hash
    ///
    /// Stops at the first failure. The genesis block itself is not checked;
    /// see [`verify_chain`](Self::verify_chain) for that.
    pub fn verify_links(blocks: &[Block]) -> Result<(), ChainError> {
        for i in 1..blocks.len() {
            Self::check_hash(i, &blocks[i])?;
            Self::check_link(i, &blocks[i - 1], &blocks[i])?;
        }
        Ok(())
    }

    /// Verify a full chain including genesis and positional indices.
    ///
    /// Checks:
    /// 1. First block carries the genesis sentinel
    /// 2. Every block's `index` equals its position
    /// 3. Every block's hash (genesis included) is correct for its fields
    /// 4. Every link matches the previous block's hash
    pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainError> {
        let Some(genesis) = blocks.first() else {
            return Ok(());
        };

        if !genesis.previous_hash.is_genesis() {
            return Err(ChainError::GenesisHasParent);
        }

        for (i, block) in blocks.iter().enumerate() {
            if block.index != i as u64 {
                return Err(ChainError::IndexMismatch {
                    index: i,
                    found: block.index,
                });
            }
            Self::check_hash(i, block)?;
            if i > 0 {
                Self::check_link(i, &blocks[i - 1], block)?;
            }
        }
        Ok(())
    }

    /// Recompute one block's hash and compare with the stored value.
    pub fn check_hash(index: usize, block: &Block) -> Result<(), ChainError> {
        let computed = BlockHasher::BLOCK
            .digest_block(block)
            .map_err(|e| ChainError::Encoding {
                index,
                reason: e.to_string(),
            })?;
        if computed != block.hash {
            return Err(ChainError::HashMismatch { index });
        }
        Ok(())
    }

    /// Check that `block` links to `previous`.
    pub fn check_link(index: usize, previous: &Block, block: &Block) -> Result<(), ChainError> {
        match block.previous_hash {
            ParentRef::Block(prev) if prev == previous.hash => Ok(()),
            ParentRef::Block(_) => Err(ChainError::BrokenLink { index }),
            ParentRef::Genesis => Err(ChainError::MissingParent { index }),
        }
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis block has a previous hash (should be \"0\")")]
    GenesisHasParent,

    #[error("block at position {index} has index {found}")]
    IndexMismatch { index: usize, found: u64 },

    #[error("broken link at index {index}: previous_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing previous_hash at index {index} (should reference previous block)")]
    MissingParent { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },

    #[error("cannot encode block {index} for hashing: {reason}")]
    Encoding { index: usize, reason: String },
}

impl ChainError {
    /// Position of the offending block, if the error is tied to one.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::GenesisHasParent => Some(0),
            Self::IndexMismatch { index, .. }
            | Self::BrokenLink { index }
            | Self::MissingParent { index }
            | Self::HashMismatch { index }
            | Self::Encoding { index, .. } => Some(*index),
        }
    }
}
