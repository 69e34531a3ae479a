use serde::{Deserialize, Serialize};

use rxl_types::Block;

use crate::error::StoreResult;

/// Durable home of a ledger's chain.
///
/// All implementations must satisfy these invariants:
/// - `load` returns exactly what the last successful `save`/`append` left.
/// - A store that has never been written loads as `Ok(None)`.
/// - Undecodable content is reported as `StoreError::CorruptStore`, never
///   silently dropped.
/// - Stores do not serialize writers. Callers own that obligation.
pub trait ChainStore: Send + Sync {
    /// Read the entire persisted chain.
    ///
    /// Returns `Ok(None)` if there is no prior state.
    fn load(&self) -> StoreResult<Option<Vec<Block>>>;

    /// Overwrite the persisted chain with `chain`.
    fn save(&self, chain: &[Block]) -> StoreResult<()>;

    /// Persist `chain` after its last block was appended.
    ///
    /// Everything before `chain.last()` is already durable. The default
    /// rewrites the whole chain; log-structured backends override this to
    /// write only the new block.
    fn append(&self, chain: &[Block]) -> StoreResult<()> {
        self.save(chain)
    }

    /// Human-readable location, for logs and diagnostics.
    fn location(&self) -> String;
}

impl<S: ChainStore + ?Sized> ChainStore for Box<S> {
    fn load(&self) -> StoreResult<Option<Vec<Block>>> {
        (**self).load()
    }

    fn save(&self, chain: &[Block]) -> StoreResult<()> {
        (**self).save(chain)
    }

    fn append(&self, chain: &[Block]) -> StoreResult<()> {
        (**self).append(chain)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Flush/sync strategy for file-backed stores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` file and directory after every write (safest, highest latency).
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

impl SyncMode {
    /// Returns `true` if writes must reach the disk before returning.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::EveryWrite)
    }
}
