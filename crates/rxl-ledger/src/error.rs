use rxl_crypto::HasherError;
use rxl_store::StoreError;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger has no blocks")]
    EmptyChain,
}

impl From<HasherError> for LedgerError {
    fn from(e: HasherError) -> Self {
        match e {
            HasherError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
