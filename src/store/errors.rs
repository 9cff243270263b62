//! Error types for the shard store.

use std::io;

use thiserror::Error;

/// Result type for shard store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures at the file-backed shard layer.
///
/// I/O failures are surfaced to the caller exactly once, never retried
/// internally. Corruption is not detectable here; the integrity envelope
/// catches it after decryption.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No shard with this name exists on disk.
    #[error("shard not found: {0}")]
    NotFound(String),

    /// The shard name would not map to a safe, injective file name.
    #[error("invalid shard name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Disk read/write/delete failure.
    #[error("I/O failure on shard {shard}: {source}")]
    Io {
        shard: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(shard: &str, source: io::Error) -> Self {
        StoreError::Io {
            shard: shard.to_string(),
            source,
        }
    }
}
