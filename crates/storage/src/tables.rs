// Path: crates/storage/src/tables.rs
//! redb table layout and key encodings.

use persona_crypto::blind_index::NAME_DIGEST_LEN;
use persona_types::person::BIRTH_DATE_LEN;
use persona_types::{BirthDate, PersonId, StoreError};
use redb::TableDefinition;
use std::fmt::Display;

/// ---- Table definitions (single DB) ----
/// Primary records: id_be(8) -> sealed bincode `Person`.
pub(crate) const PEOPLE: TableDefinition<&[u8; 8], &[u8]> = TableDefinition::new("people");
/// Id counter: "lastID" -> decimal string.
pub(crate) const PEOPLE_ID: TableDefinition<&str, &str> = TableDefinition::new("people_id");
/// Name index: keyed digest of trimmed name -> decimal id.
pub(crate) const NAME_INDEX: TableDefinition<&[u8; NAME_DIGEST_LEN], &str> =
    TableDefinition::new("name_index");
/// Birth index: "YYYY-MM-DD" + id zero-padded to 20 digits -> decimal id.
pub(crate) const BIRTH_INDEX: TableDefinition<&str, &str> = TableDefinition::new("birth_index");
/// Key check: "verifier" -> sealed marker.
pub(crate) const KEYRING: TableDefinition<&str, &[u8]> = TableDefinition::new("keyring");

pub(crate) const LAST_ID_KEY: &str = "lastID";
pub(crate) const VERIFIER_KEY: &str = "verifier";

/// Width of the zero-padded id suffix; `u64::MAX` has 20 digits.
const ID_SUFFIX_WIDTH: usize = 20;

pub(crate) fn k_people(id: PersonId) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn k_birth(birth: BirthDate, id: PersonId) -> String {
    format!("{birth}{id:0width$}", width = ID_SUFFIX_WIDTH)
}

/// Smallest birth-index key for `birth`.
pub(crate) fn k_birth_floor(birth: BirthDate) -> String {
    birth.to_string()
}

/// Splits a birth-index key into its date and id parts.
pub(crate) fn split_birth_key(key: &str) -> Result<(BirthDate, PersonId), StoreError> {
    let (date, id) = match (key.get(..BIRTH_DATE_LEN), key.get(BIRTH_DATE_LEN..)) {
        (Some(date), Some(id)) if id.len() == ID_SUFFIX_WIDTH => (date, id),
        _ => {
            return Err(StoreError::Corrupt(format!(
                "malformed birth index key '{key}'"
            )))
        }
    };
    let birth = date
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("malformed birth index key '{key}'")))?;
    Ok((birth, parse_id(id)?))
}

pub(crate) fn parse_id(raw: &str) -> Result<PersonId, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("'{raw}' is not a record id")))
}

pub(crate) fn v_id(id: PersonId) -> String {
    id.to_string()
}

/// Maps any redb failure onto [`StoreError::Backend`].
pub(crate) trait BackendExt<T> {
    fn backend(self) -> Result<T, StoreError>;
}

impl<T, E: Display> BackendExt<T> for Result<T, E> {
    fn backend(self) -> Result<T, StoreError> {
        self.map_err(|e| StoreError::Backend(e.to_string()))
    }
}
