// Path: crates/types/src/error.rs
//! Core error types for the Persona record store.

use crate::person::PersonId;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the AEAD codec and key material handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The authentication tag did not verify: wrong key, flipped bits or a
    /// ciphertext bound to different associated data.
    #[error("Authentication failed: wrong key or tampered ciphertext")]
    AuthenticationFailed,
    /// The envelope is shorter than its fixed header plus tag.
    #[error("Ciphertext too short: expected at least {min} bytes, got {got}")]
    Truncated {
        /// The minimum valid envelope length.
        min: usize,
        /// The length that was supplied.
        got: usize,
    },
    /// The envelope carries a version byte this build does not understand.
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
    /// The key material is malformed or missing.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    /// The supplied key is not the one the store was created with.
    #[error("Key does not match the key this store was created with")]
    KeyMismatch,
    /// A decrypted text field was not valid UTF-8.
    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,
    /// Reading or writing a key file failed.
    #[error("Key file I/O failed: {0}")]
    Io(String),
    /// A generic failure in the underlying cryptographic library.
    #[error("Cryptographic operation failed: {0}")]
    OperationFailed(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "CRYPTO_AUTH_FAILED",
            Self::Truncated { .. } => "CRYPTO_TRUNCATED",
            Self::UnsupportedVersion(_) => "CRYPTO_UNSUPPORTED_VERSION",
            Self::InvalidKey(_) => "CRYPTO_INVALID_KEY",
            Self::KeyMismatch => "CRYPTO_KEY_MISMATCH",
            Self::InvalidUtf8 => "CRYPTO_INVALID_UTF8",
            Self::Io(_) => "CRYPTO_IO",
            Self::OperationFailed(_) => "CRYPTO_OPERATION_FAILED",
        }
    }
}

/// Errors reported by a search projection backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// The search engine cannot be reached or has been shut down.
    #[error("Search engine unavailable: {0}")]
    Unavailable(String),
    /// A document could not be added or replaced.
    #[error("Failed to index document {id}: {reason}")]
    Index {
        /// The document identifier.
        id: PersonId,
        /// The backend's description of the failure.
        reason: String,
    },
    /// A document could not be removed.
    #[error("Failed to delete document {id}: {reason}")]
    Delete {
        /// The document identifier.
        id: PersonId,
        /// The backend's description of the failure.
        reason: String,
    },
    /// The query was rejected before execution.
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

impl ErrorCode for ProjectionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "PROJECTION_UNAVAILABLE",
            Self::Index { .. } => "PROJECTION_INDEX_FAILED",
            Self::Delete { .. } => "PROJECTION_DELETE_FAILED",
            Self::InvalidQuery(_) => "PROJECTION_INVALID_QUERY",
        }
    }
}

/// Errors surfaced by the person store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is missing or malformed. No state was changed.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// No live person has this identifier.
    #[error("Person {0} not found")]
    NotFound(PersonId),
    /// The name is already indexed under a different live person.
    #[error("Name is already registered to person {existing_id}")]
    Conflict {
        /// The person currently holding the name.
        existing_id: PersonId,
    },
    /// Encryption, decryption or key verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// A failure in the underlying key-value engine (redb).
    #[error("Backend error: {0}")]
    Backend(String),
    /// A record could not be serialized for storage.
    #[error("Encode error: {0}")]
    Encode(String),
    /// A stored record could not be deserialized.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Persisted data violates a store invariant.
    #[error("Corrupt store: {0}")]
    Corrupt(String),
    /// The search projection failed on a path where its result is required.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "STORE_VALIDATION_FAILED",
            Self::NotFound(_) => "STORE_NOT_FOUND",
            Self::Conflict { .. } => "STORE_CONFLICT",
            Self::Crypto(e) => e.code(),
            Self::Backend(_) => "STORE_BACKEND_ERROR",
            Self::Encode(_) => "STORE_ENCODE_ERROR",
            Self::Decode(_) => "STORE_DECODE_ERROR",
            Self::Corrupt(_) => "STORE_CORRUPT",
            Self::Projection(e) => e.code(),
        }
    }
}

/// The result type used throughout the store.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_keep_their_own_codes() {
        let err = StoreError::from(CryptoError::AuthenticationFailed);
        assert_eq!(err.code(), "CRYPTO_AUTH_FAILED");

        let err = StoreError::from(ProjectionError::Unavailable("down".into()));
        assert_eq!(err.code(), "PROJECTION_UNAVAILABLE");
        assert_eq!(err.to_string(), "Search engine unavailable: down");
    }

    #[test]
    fn conflict_message_names_the_holder() {
        let err = StoreError::Conflict { existing_id: 7 };
        assert_eq!(err.to_string(), "Name is already registered to person 7");
        assert_eq!(err.code(), "STORE_CONFLICT");
    }
}
