//! Append-only, tamper-evident ledger for drug supply-chain transactions.
//!
//! This crate is the heart of RXL. It provides:
//! - [`Ledger`]: genesis creation, append, read, validate, persist and reload
//! - Chain auditing with per-block violation reports
//! - A provenance projection indexing blocks by drug
//!
//! The ledger performs no locking. `append` takes `&mut self`; hosts that
//! share one ledger between tasks must serialize writers themselves, and only
//! one process may write a given store at a time.

pub mod error;
pub mod ledger;
pub mod projection;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use projection::{ProvenanceIndex, DRUG_ID_FIELD};
pub use rxl_crypto::ChainError;
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
