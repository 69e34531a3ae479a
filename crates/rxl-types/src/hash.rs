use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// 256-bit block digest.
///
/// Persisted and displayed as 64 lowercase hex characters. Ordering and
/// equality are byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Create a `BlockHash` from a pre-computed digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for BlockHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Link from a block to its predecessor.
///
/// The genesis block has no predecessor and carries the literal sentinel
/// `"0"` in its `previous_hash` field; every other block carries the hex
/// digest of the block before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// No predecessor (`"0"` on disk).
    Genesis,
    /// Digest of the preceding block.
    Block(BlockHash),
}

impl ParentRef {
    /// The persisted form of the genesis sentinel.
    pub const GENESIS_SENTINEL: &'static str = "0";

    /// Returns `true` for the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis)
    }

    /// The referenced digest, if any.
    pub fn hash(&self) -> Option<BlockHash> {
        match self {
            Self::Genesis => None,
            Self::Block(hash) => Some(*hash),
        }
    }

    /// Returns `true` if this link points at `hash`.
    pub fn points_to(&self, hash: &BlockHash) -> bool {
        matches!(self, Self::Block(h) if h == hash)
    }
}

impl From<BlockHash> for ParentRef {
    fn from(hash: BlockHash) -> Self {
        Self::Block(hash)
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => f.write_str(Self::GENESIS_SENTINEL),
            Self::Block(hash) => write!(f, "{hash}"),
        }
    }
}

impl FromStr for ParentRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::GENESIS_SENTINEL {
            Ok(Self::Genesis)
        } else {
            BlockHash::from_hex(s).map(Self::Block)
        }
    }
}

impl Serialize for ParentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
