// Path: crates/crypto/src/lib.rs
//! # Persona Crypto Crate Lints
//!
//! Panics are disallowed in non-test code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]
//! # Persona Cryptography
//!
//! Everything the store needs to keep names unreadable at rest:
//!
//! - [`RecordCipher`]: XChaCha20-Poly1305 with a fresh random nonce per seal,
//!   wrapped in a versioned, self-describing envelope.
//! - [`NameDigest`]: a keyed BLAKE3 blind index, used for name equality
//!   lookups so ciphertext never has to be deterministic.
//! - [`KeyMaterial`]: resolves the process-wide secret from a passphrase or a
//!   persisted key file and derives the two sub-keys above.

pub mod blind_index;
pub mod envelope;
pub mod keys;

pub use blind_index::NameDigest;
pub use envelope::RecordCipher;
pub use keys::KeyMaterial;
