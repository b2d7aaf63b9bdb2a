// Path: crates/telemetry/src/lib.rs
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

//! # Persona Telemetry
//!
//! Installs the process-wide `tracing` subscriber used by the `persona` binary.

/// The initialization routine for global structured logging.
pub mod init;

pub use init::init_tracing;
