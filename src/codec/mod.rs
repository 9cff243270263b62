//! Integrity envelope for shard payloads
//!
//! Every shard travels through the same pipeline on its way to disk:
//! checksum stamp over the canonical JSON, optional gzip compression,
//! then AES-256-GCM sealing under a caller-managed key. Reads reverse
//! the pipeline and fail closed at every step.
//!
//! # Invariants Enforced
//!
//! - The checksum covers the document with the checksum field absent
//! - `open` never returns plaintext for unauthenticated ciphertext
//! - Compression markers are written pre-encryption, so they are
//!   covered by the AEAD tag

mod checksum;
mod cipher;
mod compress;
mod errors;

pub use checksum::{digest_hex, mismatch_error, stamp_checksum, verify_checksum, CHECKSUM_FIELD};
pub use cipher::{open, seal};
pub use compress::{
    compress, decompress, unwrap_envelope, wrap_envelope, MARKER_COMPRESSED, MARKER_PLAIN,
};
pub use errors::{CodecError, CodecResult};
