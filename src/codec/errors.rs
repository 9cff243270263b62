//! Error types for the integrity envelope.

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures while sealing, opening, or verifying a shard payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Ciphertext failed authentication or could not be decrypted.
    ///
    /// Always fail-closed: no plaintext is ever returned alongside this.
    #[error("decryption failed: ciphertext rejected")]
    Decrypt,

    /// Input is not the JSON document shape the codec expects.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The embedded checksum does not match a recomputation.
    #[error("checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },

    /// Compression or decompression failed.
    #[error("compression codec error: {0}")]
    Compression(#[from] std::io::Error),
}
