//! SHA-256 checksum envelope for save documents
//!
//! The checksum is computed over the canonical serialized form of the
//! document with the checksum field itself absent, and stored back into
//! the document as lowercase hex under `_checksum`. serde_json keeps
//! object keys sorted, so `to_string` of the same logical document is
//! byte-stable across calls.

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::errors::CodecError;

/// Field name the digest is embedded under.
pub const CHECKSUM_FIELD: &str = "_checksum";

/// Computes the SHA-256 digest of `data` as lowercase hex.
pub fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Adds or replaces the `_checksum` field of a JSON object.
///
/// The digest covers the document serialized without the checksum field,
/// so stamping is idempotent. Non-object values are returned unchanged.
pub fn stamp_checksum(document: Value) -> Value {
    match document {
        Value::Object(mut object) => {
            object.remove(CHECKSUM_FIELD);
            let canonical = Value::Object(object.clone()).to_string();
            let checksum = digest_hex(canonical.as_bytes());
            object.insert(CHECKSUM_FIELD.to_string(), Value::String(checksum));
            Value::Object(object)
        }
        other => other,
    }
}

/// Verifies the embedded `_checksum` of a JSON object.
///
/// A document without a checksum field is treated as legacy/unverified
/// and passes. A document whose field is present but wrong fails.
pub fn verify_checksum(document: &Value) -> bool {
    let Some(object) = document.as_object() else {
        return false;
    };
    let expected = match object.get(CHECKSUM_FIELD).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s,
        _ => return true,
    };

    let mut stripped = object.clone();
    stripped.remove(CHECKSUM_FIELD);
    let canonical = Value::Object(stripped).to_string();
    digest_hex(canonical.as_bytes()) == expected
}

/// Builds the detailed mismatch error for a document that failed
/// [`verify_checksum`].
pub fn mismatch_error(document: &Value) -> CodecError {
    let expected = document
        .get(CHECKSUM_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let computed = match document.as_object() {
        Some(object) => {
            let mut stripped = object.clone();
            stripped.remove(CHECKSUM_FIELD);
            digest_hex(Value::Object(stripped).to_string().as_bytes())
        }
        None => String::new(),
    };
    CodecError::ChecksumMismatch { expected, computed }
}
