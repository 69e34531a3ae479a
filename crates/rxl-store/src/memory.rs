use std::sync::RwLock;

use rxl_types::Block;

use crate::error::StoreResult;
use crate::traits::ChainStore;

/// In-memory chain store.
///
/// Intended for tests and embedding. The chain is held behind a `RwLock`
/// and cloned on load/save. Counts writes so callers can observe how the
/// ledger persisted.
pub struct InMemoryChainStore {
    chain: RwLock<Option<Vec<Block>>>,
    writes: RwLock<usize>,
}

impl InMemoryChainStore {
    /// Create an empty store (no prior state).
    pub fn new() -> Self {
        Self {
            chain: RwLock::new(None),
            writes: RwLock::new(0),
        }
    }

    /// Create a store that already holds `chain`.
    pub fn with_chain(chain: Vec<Block>) -> Self {
        Self {
            chain: RwLock::new(Some(chain)),
            writes: RwLock::new(0),
        }
    }

    /// Snapshot of the persisted chain.
    pub fn snapshot(&self) -> Option<Vec<Block>> {
        self.chain.read().expect("lock poisoned").clone()
    }

    /// Number of save/append calls received.
    pub fn write_count(&self) -> usize {
        *self.writes.read().expect("lock poisoned")
    }

    /// Forget all persisted state.
    pub fn clear(&self) {
        *self.chain.write().expect("lock poisoned") = None;
    }
}

impl Default for InMemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainStore for InMemoryChainStore {
    fn load(&self) -> StoreResult<Option<Vec<Block>>> {
        Ok(self.snapshot())
    }

    fn save(&self, chain: &[Block]) -> StoreResult<()> {
        *self.chain.write().expect("lock poisoned") = Some(chain.to_vec());
        *self.writes.write().expect("lock poisoned") += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}

impl std::fmt::Debug for InMemoryChainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let blocks = self.snapshot().map(|c| c.len());
        f.debug_struct("InMemoryChainStore")
            .field("blocks", &blocks)
            .finish()
    }
}
