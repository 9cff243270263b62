//! Authenticated encryption for shard payloads
//!
//! AES-256-GCM with a key derived from a caller-managed secret string
//! (SHA-256 of the secret's UTF-8 bytes). Each sealed payload carries its
//! own random 96-bit nonce as a prefix, so sealing the same plaintext
//! twice never produces the same ciphertext.
//!
//! `open` fails closed: any truncated, malformed, or unauthenticated
//! ciphertext yields `CodecError::Decrypt` and nothing else.

use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use sha2::{Digest, Sha256};

use super::errors::{CodecError, CodecResult};

/// Derives a 256-bit AEAD key from a caller-supplied secret.
fn derive_key(secret: &str) -> CodecResult<LessSafeKey> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    let key_bytes = hasher.finalize();

    let unbound =
        UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|_| CodecError::Decrypt)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypts `plaintext` under `secret`.
///
/// Layout of the returned buffer: `nonce (12 bytes) || ciphertext || tag`.
pub fn seal(plaintext: &[u8], secret: &str) -> CodecResult<Vec<u8>> {
    let key = derive_key(secret)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CodecError::Decrypt)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    Ok(sealed)
}

/// Decrypts and authenticates a payload produced by [`seal`].
pub fn open(sealed: &[u8], secret: &str) -> CodecResult<Vec<u8>> {
    if sealed.len() <= NONCE_LEN {
        return Err(CodecError::Decrypt);
    }
    let key = derive_key(secret)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&sealed[..NONCE_LEN]);
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = sealed[NONCE_LEN..].to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| CodecError::Decrypt)?;
    Ok(plaintext.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test-secret-key";

    #[test]
    fn test_seal_open_round_trip() {
        let plaintext = br#"{"saveId":"slot1","gold":500}"#;
        let sealed = seal(plaintext, KEY).unwrap();
        let opened = open(&sealed, KEY).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_seal_is_randomized() {
        let sealed_a = seal(b"payload", KEY).unwrap();
        let sealed_b = seal(b"payload", KEY).unwrap();
        assert_ne!(sealed_a, sealed_b);
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let sealed = seal(b"payload", KEY).unwrap();
        assert!(matches!(
            open(&sealed, "other-key"),
            Err(CodecError::Decrypt)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let mut sealed = seal(b"payload", KEY).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&sealed, KEY).is_err());
    }

    #[test]
    fn test_tampered_nonce_fails_closed() {
        let mut sealed = seal(b"payload", KEY).unwrap();
        sealed[0] ^= 0x01;
        assert!(open(&sealed, KEY).is_err());
    }

    #[test]
    fn test_truncated_input_fails_closed() {
        assert!(open(&[], KEY).is_err());
        assert!(open(&[0u8; 11], KEY).is_err());
        let sealed = seal(b"payload", KEY).unwrap();
        assert!(open(&sealed[..sealed.len() - 4], KEY).is_err());
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let sealed = seal(b"", KEY).unwrap();
        let opened = open(&sealed, KEY).unwrap();
        assert!(opened.is_empty());
    }
}
