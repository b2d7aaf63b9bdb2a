// Path: crates/crypto/src/blind_index.rs
//! Keyed blind index for name equality lookups.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of a name digest.
pub const NAME_DIGEST_LEN: usize = 32;

/// Maps a name to a fixed-length keyed BLAKE3 digest.
///
/// Equal trimmed names always produce equal digests under the same key; the
/// digest reveals nothing else about the name.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct NameDigest {
    key: [u8; 32],
}

impl std::fmt::Debug for NameDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameDigest").finish_non_exhaustive()
    }
}

impl NameDigest {
    /// Builds a digest function from a 32-byte index key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self { key: *key }
    }

    /// Digest of `name` after trimming surrounding whitespace.
    pub fn digest(&self, name: &str) -> [u8; NAME_DIGEST_LEN] {
        *blake3::keyed_hash(&self.key, name.trim().as_bytes()).as_bytes()
    }
}
