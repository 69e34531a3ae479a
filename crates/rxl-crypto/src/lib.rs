//! Cryptographic primitives for the Rx Ledger.
//!
//! Provides the canonical, domain-separated BLAKE3 block digest and the hash
//! chain verifier built on top of it.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, HashChainVerifier};
pub use hasher::{BlockHasher, HasherError};
