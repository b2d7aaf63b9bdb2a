// Path: crates/search/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
//! # Persona Search
//!
//! An in-process [`SearchProjection`](persona_api::SearchProjection) that keeps
//! person documents in memory and answers structured queries by linear scan.

pub mod memory;
mod pattern;

pub use memory::MemorySearchIndex;
