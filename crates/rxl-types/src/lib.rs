//! Foundation types for the Rx Ledger (RXL).
//!
//! This crate provides the data model shared by every other RXL crate. It
//! holds no hashing logic and performs no I/O; blocks are plain values that
//! `rxl-crypto` fingerprints and `rxl-store` persists.
//!
//! # Key Types
//!
//! - [`Block`] -- One ledger entry with payload, linkage, and integrity hash
//! - [`BlockHash`] -- 256-bit digest, rendered as 64 lowercase hex characters
//! - [`ParentRef`] -- Link to the previous block, or the `"0"` genesis sentinel
//! - [`Timestamp`] -- Wall-clock creation time in its persisted string form
//! - [`Payload`] -- Record content (field map) or the genesis text sentinel

pub mod block;
pub mod error;
pub mod hash;
pub mod payload;
pub mod temporal;

pub use block::Block;
pub use error::TypeError;
pub use hash::{BlockHash, ParentRef};
pub use payload::Payload;
pub use temporal::Timestamp;
