// Path: crates/cli/src/commands/people.rs

use crate::util::print_json;
use anyhow::Result;
use clap::Parser;
use persona_storage::PersonStore;
use persona_types::PersonDraft;
use serde_json::json;

#[derive(Parser, Debug)]
pub struct PersonArgs {
    /// Display name; must be unique among live records.
    #[clap(long)]
    pub name: String,
    /// Birth date, `YYYY-MM-DD`.
    #[clap(long)]
    pub birth: String,
    #[clap(long)]
    pub gender: Option<String>,
}

impl From<PersonArgs> for PersonDraft {
    fn from(args: PersonArgs) -> Self {
        PersonDraft {
            name: args.name,
            gender: args.gender,
            birth: args.birth,
            ..PersonDraft::default()
        }
    }
}

pub fn add(store: &PersonStore, args: PersonArgs) -> Result<()> {
    let id = store.create(&args.into())?;
    print_json(&json!({ "id": id }))
}

pub fn get(store: &PersonStore, id: u64) -> Result<()> {
    print_json(&store.get(id)?)
}

pub fn update(store: &PersonStore, id: u64, args: PersonArgs) -> Result<()> {
    store.update(id, &args.into())?;
    print_json(&store.get(id)?)
}

pub fn delete(store: &PersonStore, id: u64) -> Result<()> {
    store.delete(id)?;
    print_json(&json!({ "deleted": id }))
}
