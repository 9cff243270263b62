use thiserror::Error;

use crate::codec::CodecError;
use crate::import::ImportError;
use crate::record::RecordError;
use crate::store::StoreError;

/// Result type for vault pipelines
pub type VaultResult<T> = Result<T, VaultError>;

/// Everything that can go wrong inside a save or load pipeline.
///
/// These never cross the public vault surface raw: operations report
/// bool or `Option` and log the cause.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Import(#[from] ImportError),

    /// Decrypted payload that is not valid JSON.
    #[error("shard payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}
