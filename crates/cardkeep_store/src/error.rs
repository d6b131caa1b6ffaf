//! # Store Error Types

use thiserror::Error;

/// Errors that can occur in the storage layer.
///
/// None of these are business errors; the game crate wraps them as internal
/// failures. Lock contention never produces an error at all - writers queue
/// on the ledger lock.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Journal or snapshot io failure.
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    /// The on-disk journal or snapshot is not something we wrote.
    #[error("store corrupt: {0}")]
    Corrupt(String),

    /// Entity encoding/decoding failure.
    #[error("store codec: {0}")]
    Codec(#[from] bincode::Error),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
