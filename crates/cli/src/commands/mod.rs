// Path: crates/cli/src/commands/mod.rs

pub mod maintain;
pub mod people;
pub mod query;
