// Path: crates/storage/src/lib.rs
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

//! Encrypted, indexed person-record store on redb.
//!
//! One redb file holds five tables: `people` (sealed primary records),
//! `people_id` (the id counter), `name_index` and `birth_index` (secondary
//! indexes) and `keyring` (the key check). Every write keeps the primary
//! record and both indexes in a single transaction; the search projection is
//! synchronized after commit on a best-effort basis.

mod allocator;
pub mod index;
pub mod maintenance;
mod record;
pub mod store;
mod tables;

pub use index::{IndexOp, IndexPlan};
pub use maintenance::{IndexReport, RebuildReport, StoreStats};
pub use store::PersonStore;
