use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::{BlockHash, ParentRef};
use crate::payload::Payload;
use crate::temporal::Timestamp;

/// One ledger entry.
///
/// Field order matches the persisted document. `hash` is stored, not
/// derived: verification recomputes it from the other four fields and
/// compares, which is what makes an edited block detectable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, 0 for genesis.
    pub index: u64,
    /// Creation time.
    pub timestamp: Timestamp,
    /// Record content.
    pub data: Payload,
    /// Digest of the preceding block, `"0"` for genesis.
    pub previous_hash: ParentRef,
    /// Digest of this block's other four fields.
    pub hash: BlockHash,
}

impl Block {
    /// Returns `true` if this block sits at the head of a chain.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_genesis()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}] {}", self.index, self.hash.short_hex(), self.data)
    }
}
