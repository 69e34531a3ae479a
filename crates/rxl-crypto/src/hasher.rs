use rxl_types::{Block, BlockHash, ParentRef, Payload, Timestamp};

/// Domain-separated BLAKE3 block hasher.
///
/// The digest input is `"<domain>:"` followed by the canonical encoding of a
/// block's four content fields: the JSON array
/// `[index, timestamp, data, previous_hash]`. Record payloads are key-sorted
/// maps and JSON string escaping is fixed, so the encoding is unambiguous and
/// identical inputs always hash identically.
pub struct BlockHasher {
    domain: &'static str,
}

impl BlockHasher {
    /// Hasher for ledger blocks.
    pub const BLOCK: Self = Self {
        domain: "rxl-block-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Canonical byte encoding of the hashed fields (without domain tag).
    pub fn canonical_bytes(
        index: u64,
        timestamp: &Timestamp,
        data: &Payload,
        previous_hash: &ParentRef,
    ) -> Result<Vec<u8>, HasherError> {
        serde_json::to_vec(&(index, timestamp, data, previous_hash))
            .map_err(|e| HasherError::Serialization(e.to_string()))
    }

    /// Digest of a block's content fields.
    pub fn digest(
        &self,
        index: u64,
        timestamp: &Timestamp,
        data: &Payload,
        previous_hash: &ParentRef,
    ) -> Result<BlockHash, HasherError> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        serde_json::to_writer(&mut hasher, &(index, timestamp, data, previous_hash))
            .map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(BlockHash::from_bytes(*hasher.finalize().as_bytes()))
    }

    /// Recompute the digest of an existing block from its stored fields.
    pub fn digest_block(&self, block: &Block) -> Result<BlockHash, HasherError> {
        self.digest(
            block.index,
            &block.timestamp,
            &block.data,
            &block.previous_hash,
        )
    }

    /// Returns `true` if the block's stored hash matches its content.
    pub fn verify(&self, block: &Block) -> Result<bool, HasherError> {
        Ok(self.digest_block(block)? == block.hash)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
