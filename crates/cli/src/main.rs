// Path: crates/cli/src/main.rs
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

//! # Persona CLI
//!
//! Manages an encrypted person-record store from the command line. Every
//! command prints JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use persona_crypto::KeyMaterial;
use persona_search::MemorySearchIndex;
use persona_storage::PersonStore;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod util;

use commands::*;

#[derive(Parser, Debug)]
#[clap(
    name = "persona",
    version,
    about = "Encrypted, indexed person-record store.",
    long_about = "Stores person records with the name encrypted at rest, looks them up by id, exact name or birth-date range, and answers structured searches."
)]
struct Cli {
    /// Path of the TOML configuration file. Defaults apply when it is missing.
    #[clap(long, short, default_value = "persona.toml")]
    config: PathBuf,

    /// Overrides `data_path` from the configuration.
    #[clap(long)]
    data_path: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // --- Records ---
    /// Create a person and print the assigned id.
    Add(people::PersonArgs),

    /// Print one person.
    Get { id: u64 },

    /// Replace a person's name, gender and birth date.
    Update {
        id: u64,
        #[clap(flatten)]
        person: people::PersonArgs,
    },

    /// Delete a person.
    Delete { id: u64 },

    // --- Queries ---
    /// Look a person up by exact name.
    FindName { name: String },

    /// List everyone born within an inclusive date range.
    FindBirth { from: String, to: String },

    /// List everyone whose age in full years lies within an inclusive range.
    FindAge { min_age: u16, max_age: u16 },

    /// Structured search over the projection.
    Search(query::SearchArgs),

    /// List every person in id order.
    List {
        #[clap(long)]
        limit: Option<usize>,
    },

    // --- Maintenance ---
    /// Load people from a JSON file, or the bundled sample set.
    Seed {
        #[clap(long)]
        file: Option<PathBuf>,
    },

    /// Rebuild the search projection from the store.
    RebuildProjection,

    /// Check both secondary indexes against the primary records.
    Verify,

    /// Print record and index entry counts.
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = util::load_config(&cli.config)?;
    if let Some(path) = cli.data_path {
        config.data_path = path;
    }
    persona_telemetry::init_tracing(config.logging.format)?;

    let key_source = util::key_source_with_env(config.key.clone());
    let keys = KeyMaterial::resolve(&key_source).context("Failed to resolve key material")?;
    let projection = Arc::new(MemorySearchIndex::new());
    let store = PersonStore::open(&config.data_path, &keys, projection)
        .with_context(|| format!("Failed to open store at {}", config.data_path.display()))?
        .with_default_limit(config.search.default_limit);
    drop(keys);

    // The in-memory projection starts empty every run.
    let rebuilt = store.rebuild_projection()?;
    tracing::debug!(
        target: "cli",
        indexed = rebuilt.indexed,
        failed = rebuilt.failed.len(),
        "Search projection loaded"
    );

    match cli.command {
        Commands::Add(args) => people::add(&store, args),
        Commands::Get { id } => people::get(&store, id),
        Commands::Update { id, person } => people::update(&store, id, person),
        Commands::Delete { id } => people::delete(&store, id),

        Commands::FindName { name } => query::find_name(&store, &name),
        Commands::FindBirth { from, to } => query::find_birth(&store, &from, &to),
        Commands::FindAge { min_age, max_age } => query::find_age(&store, min_age, max_age),
        Commands::Search(args) => query::search(&store, args),
        Commands::List { limit } => query::list(&store, limit),

        Commands::Seed { file } => maintain::seed(&store, file.as_deref()),
        Commands::RebuildProjection => util::print_json(&rebuilt),
        Commands::Verify => maintain::verify(&store),
        Commands::Stats => maintain::stats(&store),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_and_subcommands() {
        let cli = Cli::try_parse_from([
            "persona",
            "--config",
            "alt.toml",
            "--data-path",
            "/tmp/p.redb",
            "update",
            "7",
            "--name",
            "Alice",
            "--birth",
            "1994-05-01",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert_eq!(cli.data_path, Some(PathBuf::from("/tmp/p.redb")));
        match cli.command {
            Commands::Update { id, person } => {
                assert_eq!(id, 7);
                assert_eq!(person.name, "Alice");
                assert_eq!(person.gender, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn kebab_case_subcommands() {
        for args in [
            vec!["persona", "find-name", "Alice"],
            vec!["persona", "find-birth", "1990-01-01", "1991-01-01"],
            vec!["persona", "find-age", "30", "39"],
            vec!["persona", "rebuild-projection"],
            vec!["persona", "search", "--name", "a*", "--sort", "birth-desc"],
        ] {
            Cli::try_parse_from(&args).unwrap();
        }
    }

    #[test]
    fn search_rejects_bad_dates() {
        assert!(Cli::try_parse_from(["persona", "search", "--from", "yesterday"]).is_err());
    }
}
