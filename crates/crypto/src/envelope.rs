// Path: crates/crypto/src/envelope.rs
//! Authenticated encryption of stored records.
//!
//! Format V1:
//! [ Version: u8 (1) ]
//! [ Nonce: 24B ]
//! [ Ciphertext + Tag: N + 16 ]
//!
//! Every seal draws a fresh XChaCha20-Poly1305 nonce from the OS RNG, so
//! sealing the same plaintext twice yields unrelated envelopes. The caller's
//! associated data is authenticated but not stored; it must be supplied again
//! to open the envelope.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use persona_types::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

const ENVELOPE_VERSION: u8 = 1;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// The shortest byte string that can be a valid envelope (empty plaintext).
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_LEN;

/// Symmetric AEAD codec bound to one data key for the process lifetime.
#[derive(Clone)]
pub struct RecordCipher {
    aead: XChaCha20Poly1305,
}

impl fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCipher").finish_non_exhaustive()
    }
}

impl RecordCipher {
    /// Builds a codec from a 32-byte data key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Encrypts `plaintext`, authenticating `aad` alongside it.
    pub fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .aead
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::OperationFailed(format!("Encryption failed: {}", e)))?;

        let mut output = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        output.push(ENVELOPE_VERSION);
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Decrypts an envelope produced by [`seal`](Self::seal) with the same key
    /// and associated data.
    ///
    /// Truncated input, an unknown version, a wrong key, mismatched `aad` or any
    /// flipped bit all fail; no plaintext is ever returned on failure.
    pub fn open(&self, envelope: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if envelope.len() < MIN_ENVELOPE_LEN {
            return Err(CryptoError::Truncated {
                min: MIN_ENVELOPE_LEN,
                got: envelope.len(),
            });
        }
        let (header, body) = envelope.split_at(HEADER_LEN);
        let (version, nonce) = header.split_first().ok_or(CryptoError::Truncated {
            min: MIN_ENVELOPE_LEN,
            got: envelope.len(),
        })?;
        if *version != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion(*version));
        }

        self.aead
            .decrypt(XNonce::from_slice(nonce), Payload { msg: body, aad })
            .map_err(|_| CryptoError::AuthenticationFailed)
    }

    /// Seals a UTF-8 string.
    pub fn encrypt_str(&self, plaintext: &str, aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.seal(plaintext.as_bytes(), aad)
    }

    /// Opens an envelope and requires the payload to be UTF-8.
    pub fn decrypt_str(&self, envelope: &[u8], aad: &[u8]) -> Result<String, CryptoError> {
        let bytes = self.open(envelope, aad)?;
        String::from_utf8(bytes).map_err(|_| CryptoError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(seed: u8) -> RecordCipher {
        RecordCipher::new(&[seed; 32])
    }

    #[test]
    fn test_roundtrip_v1() {
        let c = cipher(1);
        for text in ["", "Alice", "김철수", "a much longer name with spaces and punctuation!"] {
            let sealed = c.encrypt_str(text, b"ctx").unwrap();
            assert_eq!(sealed.len(), MIN_ENVELOPE_LEN + text.len());
            assert_eq!(sealed[0], ENVELOPE_VERSION);
            assert_eq!(c.decrypt_str(&sealed, b"ctx").unwrap(), text);
        }
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let c = cipher(1);
        let a = c.seal(b"Alice", b"").unwrap();
        let b = c.seal(b"Alice", b"").unwrap();
        assert_ne!(a, b);
        assert_ne!(a[1..HEADER_LEN], b[1..HEADER_LEN]);
    }

    #[test]
    fn test_any_flipped_bit_fails_authentication() {
        let c = cipher(2);
        let sealed = c.seal(b"Bob", b"id-1").unwrap();
        for i in 1..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                c.open(&tampered, b"id-1"),
                Err(CryptoError::AuthenticationFailed),
                "byte {i}"
            );
        }
    }

    #[test]
    fn test_wrong_key() {
        let sealed = cipher(3).seal(b"Carol", b"").unwrap();
        assert_eq!(
            cipher(4).open(&sealed, b""),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_associated_data_is_bound() {
        let c = cipher(5);
        let sealed = c.seal(b"Dave", &7u64.to_be_bytes()).unwrap();
        assert_eq!(
            c.open(&sealed, &8u64.to_be_bytes()),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_truncated_and_unknown_version() {
        let c = cipher(6);
        let sealed = c.seal(b"Eve", b"").unwrap();

        let short = &sealed[..MIN_ENVELOPE_LEN - 1];
        assert_eq!(
            c.open(short, b""),
            Err(CryptoError::Truncated {
                min: MIN_ENVELOPE_LEN,
                got: MIN_ENVELOPE_LEN - 1
            })
        );

        // Dropping the last byte keeps the length valid but breaks the tag.
        let clipped = &sealed[..sealed.len() - 1];
        assert_eq!(c.open(clipped, b""), Err(CryptoError::AuthenticationFailed));

        let mut bumped = sealed.clone();
        bumped[0] = 9;
        assert_eq!(c.open(&bumped, b""), Err(CryptoError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_decrypt_str_rejects_non_utf8() {
        let c = cipher(7);
        let sealed = c.seal(&[0xff, 0xfe], b"").unwrap();
        assert_eq!(c.decrypt_str(&sealed, b""), Err(CryptoError::InvalidUtf8));
    }
}
