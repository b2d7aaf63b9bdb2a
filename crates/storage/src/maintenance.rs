// Path: crates/storage/src/maintenance.rs
//! Out-of-band repair and inspection of a person store.

use crate::allocator;
use crate::store::PersonStore;
use crate::tables::{
    k_birth, parse_id, split_birth_key, BackendExt, BIRTH_INDEX, NAME_INDEX, PEOPLE,
};
use persona_types::{Person, PersonDraft, PersonId, Result, StoreError};
use redb::ReadableTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of [`PersonStore::rebuild_projection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Documents pushed successfully.
    pub indexed: usize,
    /// Ids the projection rejected.
    pub failed: Vec<PersonId>,
}

/// Outcome of [`PersonStore::verify_indexes`]. Every list is sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Live records inspected.
    pub records: usize,
    /// Records with no name entry pointing back at them.
    pub missing_name: Vec<PersonId>,
    /// Records with no birth entry for their current birth date.
    pub missing_birth: Vec<PersonId>,
    /// Name entries whose id is absent or whose record has another name.
    pub stale_name: Vec<PersonId>,
    /// Birth entries whose id is absent or whose record has another birth date.
    pub stale_birth: Vec<PersonId>,
}

impl IndexReport {
    /// True when both indexes mirror the primary records exactly.
    pub fn is_consistent(&self) -> bool {
        self.missing_name.is_empty()
            && self.missing_birth.is_empty()
            && self.stale_name.is_empty()
            && self.stale_birth.is_empty()
    }
}

/// Entry counts from [`PersonStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Live primary records.
    pub records: u64,
    /// Name index entries.
    pub name_entries: u64,
    /// Birth index entries.
    pub birth_entries: u64,
    /// Highest id ever allocated.
    pub last_id: Option<PersonId>,
}

impl PersonStore {
    /// Clears the search projection and re-indexes every live record.
    ///
    /// Clearing is required to succeed; individual documents that fail to
    /// index are reported rather than aborting the rebuild.
    pub fn rebuild_projection(&self) -> Result<RebuildReport> {
        let projection = self.projection();
        projection.clear()?;

        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        let mut report = RebuildReport::default();
        for entry in people.iter().backend()? {
            let (key, value) = entry.backend()?;
            let id = PersonId::from_be_bytes(*key.value());
            let person = self.codec().open(id, value.value())?;
            match projection.index(id, &person.document()) {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    tracing::warn!(target: "projection", id, error = %e, "Failed to re-index person");
                    report.failed.push(id);
                }
            }
        }

        tracing::info!(
            target: "projection",
            indexed = report.indexed,
            failed = report.failed.len(),
            "Rebuilt search projection"
        );
        Ok(report)
    }

    /// Cross-checks both secondary indexes against the primary records in a
    /// single read snapshot.
    pub fn verify_indexes(&self) -> Result<IndexReport> {
        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        let names = r.open_table(NAME_INDEX).backend()?;
        let births = r.open_table(BIRTH_INDEX).backend()?;
        let codec = self.codec();

        let mut live: BTreeMap<PersonId, Person> = BTreeMap::new();
        for entry in people.iter().backend()? {
            let (key, value) = entry.backend()?;
            let id = PersonId::from_be_bytes(*key.value());
            live.insert(id, codec.open(id, value.value())?);
        }

        let mut report = IndexReport {
            records: live.len(),
            ..IndexReport::default()
        };

        for (id, person) in &live {
            let name_holder = names
                .get(&codec.name_key(&person.name))
                .backend()?
                .map(|v| parse_id(v.value()))
                .transpose()?;
            if name_holder != Some(*id) {
                report.missing_name.push(*id);
            }
            let birth_holder = births
                .get(k_birth(person.birth, *id).as_str())
                .backend()?
                .map(|v| parse_id(v.value()))
                .transpose()?;
            if birth_holder != Some(*id) {
                report.missing_birth.push(*id);
            }
        }

        for entry in names.iter().backend()? {
            let (digest, value) = entry.backend()?;
            let id = parse_id(value.value())?;
            let matches = live
                .get(&id)
                .is_some_and(|p| &codec.name_key(&p.name) == digest.value());
            if !matches {
                report.stale_name.push(id);
            }
        }

        for entry in births.iter().backend()? {
            let (key, _) = entry.backend()?;
            let (birth, id) = split_birth_key(key.value())?;
            if !live.get(&id).is_some_and(|p| p.birth == birth) {
                report.stale_birth.push(id);
            }
        }
        report.stale_name.sort_unstable();
        report.stale_birth.sort_unstable();

        if !report.is_consistent() {
            tracing::warn!(target: "storage", ?report, "Index verification found inconsistencies");
        }
        Ok(report)
    }

    /// Record and index entry counts plus the id counter.
    pub fn stats(&self) -> Result<StoreStats> {
        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        let names = r.open_table(NAME_INDEX).backend()?;
        let births = r.open_table(BIRTH_INDEX).backend()?;
        let stats = StoreStats {
            records: people.len().backend()?,
            name_entries: names.len().backend()?,
            birth_entries: births.len().backend()?,
            last_id: allocator::peek_last_id(&r)?,
        };
        Ok(stats)
    }

    /// Creates each draft in turn. Drafts whose name is already taken are
    /// skipped with a warning; any other failure stops the run.
    pub fn seed<I>(&self, drafts: I) -> Result<Vec<PersonId>>
    where
        I: IntoIterator<Item = PersonDraft>,
    {
        let mut created = Vec::new();
        for draft in drafts {
            match self.create(&draft) {
                Ok(id) => created.push(id),
                Err(StoreError::Conflict { existing_id }) => tracing::warn!(
                    target: "storage",
                    existing_id,
                    "Skipping seed entry with a duplicate name"
                ),
                Err(e) => return Err(e),
            }
        }
        tracing::info!(target: "storage", created = created.len(), "Seeded person store");
        Ok(created)
    }
}
