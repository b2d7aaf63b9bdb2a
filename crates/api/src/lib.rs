// Path: crates/api/src/lib.rs

//! # Persona API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free code. Panics are disallowed in non-test code.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Persona API
//!
//! Contracts for the collaborators the person store consumes but does not
//! own. Today that is the full-text search engine holding the searchable
//! projection of person records.

/// The search projection contract and its query types.
pub mod search;

pub use search::{SearchHit, SearchProjection, SearchQuery, SortOrder};
