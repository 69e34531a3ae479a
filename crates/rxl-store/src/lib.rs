//! Persistence backends for the Rx Ledger.
//!
//! The ledger keeps its authoritative chain in memory and hands it to a
//! [`ChainStore`] for durable load/save. The store never interprets blocks
//! beyond decoding them; integrity checking belongs to the ledger.
//!
//! # Storage Backends
//!
//! - [`JsonFileStore`] -- one human-readable JSON document, rewritten atomically
//! - [`LogFileStore`] -- append-only log of length-prefixed, CRC-checked frames
//! - [`InMemoryChainStore`] -- `RwLock`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A missing file is "no prior state", never an error.
//! 2. Content that exists but cannot be decoded is a `CorruptStore` error.
//! 3. Rewrites go to a temporary file that is renamed over the target.
//! 4. All I/O errors on write are propagated, never silently ignored.
//! 5. One writer at a time; stores do not arbitrate between processes.

pub mod error;
pub mod json;
pub mod log;
pub mod memory;
pub mod traits;

mod atomic;

pub use error::{StoreError, StoreResult};
pub use json::JsonFileStore;
pub use log::LogFileStore;
pub use memory::InMemoryChainStore;
pub use traits::{ChainStore, SyncMode};
