// Path: crates/crypto/src/keys.rs
//! Resolution of the process-wide key material.
//!
//! A store is bound to one 32-byte master secret, obtained either from a
//! passphrase (SHA-256 of its bytes) or from a raw key file that is generated
//! on first use. Two independent sub-keys are expanded from the master with
//! HKDF-SHA256: one for the record cipher, one for the blind name index.

use crate::blind_index::NameDigest;
use crate::envelope::RecordCipher;
use hkdf::Hkdf;
use persona_types::config::{KeySource, PASSPHRASE_ENV};
use persona_types::CryptoError;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the master secret and of each derived sub-key.
pub const KEY_LEN: usize = 32;

const DATA_KEY_INFO: &[u8] = b"persona/record-cipher/v1";
const INDEX_KEY_INFO: &[u8] = b"persona/name-index/v1";

/// A 32-byte secret that zeroizes on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct SecretKey([u8; KEY_LEN]);

/// The derived sub-keys for one store.
pub struct KeyMaterial {
    data_key: SecretKey,
    index_key: SecretKey,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Resolves key material from a configured source.
    ///
    /// A passphrase source without a passphrase is an error here; the binary
    /// fills it in from [`PASSPHRASE_ENV`] before calling.
    pub fn resolve(source: &KeySource) -> Result<Self, CryptoError> {
        match source {
            KeySource::Passphrase {
                passphrase: Some(passphrase),
            } => Self::from_passphrase(passphrase),
            KeySource::Passphrase { passphrase: None } => Err(CryptoError::InvalidKey(format!(
                "no passphrase configured (set {PASSPHRASE_ENV})"
            ))),
            KeySource::KeyFile { path } => Self::from_key_file(path),
        }
    }

    /// Derives the master secret as SHA-256 of the passphrase.
    pub fn from_passphrase(passphrase: &str) -> Result<Self, CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::InvalidKey("passphrase is empty".into()));
        }
        let mut master: [u8; KEY_LEN] = Sha256::digest(passphrase.as_bytes()).into();
        let material = Self::from_master(&master);
        master.zeroize();
        material
    }

    /// Reads a raw 32-byte master secret from `path`, generating and
    /// persisting a fresh one if the file does not exist yet.
    pub fn from_key_file(path: &Path) -> Result<Self, CryptoError> {
        let mut master = match fs::read(path) {
            Ok(mut bytes) => {
                let parsed: Result<[u8; KEY_LEN], _> = bytes.as_slice().try_into();
                let len = bytes.len();
                bytes.zeroize();
                parsed.map_err(|_| {
                    CryptoError::InvalidKey(format!(
                        "key file {} holds {len} bytes, expected {KEY_LEN}",
                        path.display()
                    ))
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut fresh = [0u8; KEY_LEN];
                OsRng.fill_bytes(&mut fresh);
                write_key_file(path, &fresh)?;
                tracing::info!(target: "crypto", path = %path.display(), "Generated new key file");
                fresh
            }
            Err(e) => {
                return Err(CryptoError::Io(format!(
                    "Failed to read key file {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let material = Self::from_master(&master);
        master.zeroize();
        material
    }

    /// Expands both sub-keys from a master secret.
    pub fn from_master(master: &[u8; KEY_LEN]) -> Result<Self, CryptoError> {
        let hk = Hkdf::<Sha256>::new(None, master);
        let mut data_key = SecretKey([0u8; KEY_LEN]);
        let mut index_key = SecretKey([0u8; KEY_LEN]);
        hk.expand(DATA_KEY_INFO, &mut data_key.0)
            .map_err(|e| CryptoError::OperationFailed(format!("HKDF expand failed: {}", e)))?;
        hk.expand(INDEX_KEY_INFO, &mut index_key.0)
            .map_err(|e| CryptoError::OperationFailed(format!("HKDF expand failed: {}", e)))?;
        Ok(Self {
            data_key,
            index_key,
        })
    }

    /// The AEAD codec keyed with the data sub-key.
    pub fn record_cipher(&self) -> RecordCipher {
        RecordCipher::new(&self.data_key.0)
    }

    /// The blind index keyed with the index sub-key.
    pub fn name_digest(&self) -> NameDigest {
        NameDigest::new(&self.index_key.0)
    }
}

fn write_key_file(path: &Path, key: &[u8; KEY_LEN]) -> Result<(), CryptoError> {
    let io_err = |e: std::io::Error| {
        CryptoError::Io(format!("Failed to write key file {}: {}", path.display(), e))
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(key).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}
