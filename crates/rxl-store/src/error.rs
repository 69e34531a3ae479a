/// Errors from chain store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted content exists but cannot be decoded.
    #[error("corrupt store {location}: {reason}")]
    CorruptStore { location: String, reason: String },

    /// Serialization failure while writing.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
