use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use rxl_types::Block;

use crate::atomic::{read_existing, write_atomic};
use crate::error::{StoreError, StoreResult};
use crate::traits::{ChainStore, SyncMode};

/// The whole chain as one pretty-printed JSON array.
///
/// Every write rewrites the document. The file stays human-readable and
/// diffable, at the cost of O(n) work per append.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    sync_mode: SyncMode,
}

impl JsonFileStore {
    /// Store backed by the document at `path`. Nothing is touched until the
    /// first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_mode: SyncMode::default(),
        }
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> StoreResult<Option<Vec<Block>>> {
        let Some(bytes) = read_existing(&self.path) else {
            return Ok(None);
        };

        let chain: Vec<Block> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::CorruptStore {
                location: self.location(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), blocks = chain.len(), "loaded chain document");
        Ok(Some(chain))
    }

    fn save(&self, chain: &[Block]) -> StoreResult<()> {
        write_atomic(&self.path, self.sync_mode, |writer| {
            let mut ser =
                serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"    "));
            chain
                .serialize(&mut ser)
                .map_err(|e| StoreError::Serialization(e.to_string()))
        })?;

        debug!(path = %self.path.display(), blocks = chain.len(), "saved chain document");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
