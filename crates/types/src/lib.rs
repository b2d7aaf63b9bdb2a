// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Persona Types
//!
//! Core data structures shared by every Persona crate: the `Person` entity and
//! its caller-facing input form, the plaintext document pushed to the search
//! projection, configuration, and the error taxonomy.

/// Shared configuration structures for the store, key material and logging.
pub mod config;
/// Core error types and their stable machine-readable codes.
pub mod error;
/// The person entity, its draft input and its search document.
pub mod person;

pub use error::{CryptoError, ErrorCode, ProjectionError, Result, StoreError};
pub use person::{BirthDate, Person, PersonDocument, PersonDraft, PersonFields, PersonId};
