// Path: crates/cli/src/commands/maintain.rs

use crate::util::print_json;
use anyhow::{bail, Context, Result};
use persona_storage::PersonStore;
use persona_types::PersonDraft;
use serde_json::json;
use std::path::Path;

/// Sample people loaded by `seed` when no file is given.
const SAMPLE_PEOPLE: &str = include_str!("../../data/people.json");

fn parse_drafts(json: &str) -> Result<Vec<PersonDraft>> {
    serde_json::from_str(json).context("Seed data must be a JSON array of people")
}

pub fn seed(store: &PersonStore, file: Option<&Path>) -> Result<()> {
    let drafts = match file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seed file {}", path.display()))?;
            parse_drafts(&raw)?
        }
        None => parse_drafts(SAMPLE_PEOPLE)?,
    };
    let offered = drafts.len();
    let created = store.seed(drafts)?;
    print_json(&json!({
        "offered": offered,
        "created": created,
        "skipped": offered - created.len(),
    }))
}

pub fn verify(store: &PersonStore) -> Result<()> {
    let report = store.verify_indexes()?;
    print_json(&report)?;
    if !report.is_consistent() {
        bail!("Secondary indexes are inconsistent with the primary records");
    }
    Ok(())
}

pub fn stats(store: &PersonStore) -> Result<()> {
    print_json(&store.stats()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_people_parse_and_validate() {
        let drafts = parse_drafts(SAMPLE_PEOPLE).unwrap();
        assert_eq!(drafts.len(), 50);
        for draft in &drafts {
            draft.validate().unwrap();
        }
    }
}
