// Path: crates/storage/src/store.rs
use crate::allocator;
use crate::index::IndexPlan;
use crate::record::RecordCodec;
use crate::tables::{
    k_birth_floor, k_people, parse_id, split_birth_key, BackendExt, BIRTH_INDEX, KEYRING,
    NAME_INDEX, PEOPLE, PEOPLE_ID, VERIFIER_KEY,
};
use persona_api::{SearchProjection, SearchQuery};
use persona_crypto::KeyMaterial;
use persona_types::config::DEFAULT_SEARCH_LIMIT;
use persona_types::{BirthDate, Person, PersonDraft, PersonId, Result, StoreError};
use redb::{Database, ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use time::{Date, OffsetDateTime};

/// The encrypted, indexed person store.
///
/// Every mutation runs in one redb write transaction that covers the primary
/// record, both secondary indexes and (for creates) the id counter. Once that
/// transaction commits the change is pushed to the search projection; a
/// projection failure is logged and left for [`rebuild_projection`] to repair.
///
/// [`rebuild_projection`]: PersonStore::rebuild_projection
pub struct PersonStore {
    db: Database,
    codec: RecordCodec,
    projection: Arc<dyn SearchProjection>,
    default_limit: usize,
}

impl std::fmt::Debug for PersonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonStore")
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}

impl PersonStore {
    /// Opens or creates the store at `path`.
    ///
    /// A new store records a sealed key check; an existing one must open it
    /// with `keys`, otherwise this fails with `CryptoError::KeyMismatch`
    /// before any record is touched.
    pub fn open<P: AsRef<Path>>(
        path: P,
        keys: &KeyMaterial,
        projection: Arc<dyn SearchProjection>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path).backend()?;
        let codec = RecordCodec::new(keys);

        // Ensure tables exist and the key matches
        let w = db.begin_write().backend()?;
        {
            w.open_table(PEOPLE).backend()?;
            w.open_table(PEOPLE_ID).backend()?;
            w.open_table(NAME_INDEX).backend()?;
            w.open_table(BIRTH_INDEX).backend()?;
            let mut keyring = w.open_table(KEYRING).backend()?;
            let existing = keyring
                .get(VERIFIER_KEY)
                .backend()?
                .map(|v| v.value().to_vec());
            match existing {
                Some(sealed) => codec.check_verifier(&sealed)?,
                None => {
                    let sealed = codec.seal_verifier()?;
                    keyring.insert(VERIFIER_KEY, sealed.as_slice()).backend()?;
                    tracing::info!(target: "storage", path = %path.display(), "Initialized new person store");
                }
            }
        }
        w.commit().backend()?;

        tracing::info!(target: "storage", path = %path.display(), "Opened person store");
        Ok(Self {
            db,
            codec,
            projection,
            default_limit: DEFAULT_SEARCH_LIMIT,
        })
    }

    /// Overrides the limit applied to searches that do not set one.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub(crate) fn read_txn(&self) -> Result<ReadTransaction<'_>> {
        self.db.begin_read().backend()
    }

    fn write_txn(&self) -> Result<WriteTransaction<'_>> {
        self.db.begin_write().backend()
    }

    pub(crate) fn codec(&self) -> &RecordCodec {
        &self.codec
    }

    pub(crate) fn projection(&self) -> &dyn SearchProjection {
        self.projection.as_ref()
    }

    /// Validates `draft`, assigns the next id and stores the record with both
    /// index entries. Returns the new id.
    pub fn create(&self, draft: &PersonDraft) -> Result<PersonId> {
        let fields = draft.validate()?;

        let w = self.write_txn()?;
        let id = allocator::next_id(&w)?;
        let person = fields.into_person(id, registration_time());
        {
            let sealed = self.codec.seal(&person)?;
            let mut people = w.open_table(PEOPLE).backend()?;
            people
                .insert(&k_people(id), sealed.as_slice())
                .backend()?;
        }
        IndexPlan::for_create(self.codec.names(), &person).apply(&w)?;
        w.commit().backend()?;

        tracing::info!(target: "storage", id, "Created person");
        self.project(&person);
        Ok(id)
    }

    /// Reads and decrypts one record.
    pub fn get(&self, id: PersonId) -> Result<Person> {
        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        self.codec.load(&people, id)?.ok_or(StoreError::NotFound(id))
    }

    /// Replaces the mutable fields of `id`. The id and registration time of
    /// the stored record always win over whatever `draft` carries.
    pub fn update(&self, id: PersonId, draft: &PersonDraft) -> Result<()> {
        let fields = draft.validate()?;

        let w = self.write_txn()?;
        let (existing, updated) = {
            let mut people = w.open_table(PEOPLE).backend()?;
            let existing = self
                .codec
                .load(&people, id)?
                .ok_or(StoreError::NotFound(id))?;
            let updated = fields.into_person(id, existing.registered_at);
            let sealed = self.codec.seal(&updated)?;
            people
                .insert(&k_people(id), sealed.as_slice())
                .backend()?;
            (existing, updated)
        };
        IndexPlan::plan(self.codec.names(), Some(&existing), &updated).apply(&w)?;
        w.commit().backend()?;

        tracing::info!(target: "storage", id, "Updated person");
        self.project(&updated);
        Ok(())
    }

    /// Removes the record and both of its index entries.
    pub fn delete(&self, id: PersonId) -> Result<()> {
        let w = self.write_txn()?;
        let existing = {
            let mut people = w.open_table(PEOPLE).backend()?;
            let existing = self
                .codec
                .load(&people, id)?
                .ok_or(StoreError::NotFound(id))?;
            people.remove(&k_people(id)).backend()?;
            existing
        };
        IndexPlan::for_removal(self.codec.names(), &existing).apply(&w)?;
        w.commit().backend()?;

        tracing::info!(target: "storage", id, "Deleted person");
        if let Err(e) = self.projection.delete(id) {
            tracing::warn!(target: "projection", id, error = %e, "Failed to remove person from search projection");
        }
        Ok(())
    }

    /// Exact lookup on the trimmed name. An unknown name is `Ok(None)`.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Person>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let digest = self.codec.name_key(name);

        let r = self.read_txn()?;
        let names = r.open_table(NAME_INDEX).backend()?;
        let id = match names.get(&digest).backend()? {
            Some(v) => parse_id(v.value())?,
            None => return Ok(None),
        };
        let people = r.open_table(PEOPLE).backend()?;
        let found = self.codec.load(&people, id)?;
        if found.is_none() {
            tracing::warn!(target: "storage", id, "Name index points at a missing record");
        }
        Ok(found)
    }

    /// Everyone born within `[start, end]` (both inclusive, `YYYY-MM-DD`),
    /// ordered by birth date and then id. `start > end` yields nothing.
    pub fn find_by_birth_range(&self, start: &str, end: &str) -> Result<Vec<Person>> {
        let start: BirthDate = start.parse()?;
        let end: BirthDate = end.parse()?;
        self.scan_births(start, end)
    }

    /// Everyone aged `min_age..=max_age` full years today (UTC), ordered by
    /// birth date and then id. A person whose birthday is today counts as the
    /// new age.
    pub fn find_by_age_range(&self, min_age: u16, max_age: u16) -> Result<Vec<Person>> {
        self.find_by_age_range_on(min_age, max_age, OffsetDateTime::now_utc().date())
    }

    /// [`find_by_age_range`](Self::find_by_age_range) evaluated on `today`.
    pub fn find_by_age_range_on(&self, min_age: u16, max_age: u16, today: Date) -> Result<Vec<Person>> {
        match BirthDate::window_for_ages(min_age, max_age, today) {
            Some((start, end)) => self.scan_births(start, end),
            None => Ok(Vec::new()),
        }
    }

    fn scan_births(&self, start: BirthDate, end: BirthDate) -> Result<Vec<Person>> {
        if start > end {
            return Ok(Vec::new());
        }

        let r = self.read_txn()?;
        let births = r.open_table(BIRTH_INDEX).backend()?;
        let people = r.open_table(PEOPLE).backend()?;

        let floor = k_birth_floor(start);
        let mut out = Vec::new();
        for entry in births.range(floor.as_str()..).backend()? {
            let (key, value) = entry.backend()?;
            let (birth, key_id) = split_birth_key(key.value())?;
            if birth > end {
                break;
            }
            if birth < start {
                continue;
            }
            let id = parse_id(value.value())?;
            if id != key_id {
                return Err(StoreError::Corrupt(format!(
                    "birth index key for id {key_id} maps to id {id}"
                )));
            }
            match self.codec.load(&people, id)? {
                Some(person) => out.push(person),
                None => {
                    tracing::warn!(target: "storage", id, "Birth index points at a missing record")
                }
            }
        }
        Ok(out)
    }

    /// Every live record in id order, at most `limit` of them.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<Person>> {
        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        let limit = limit.unwrap_or(usize::MAX);

        let mut out = Vec::new();
        for entry in people.iter().backend()? {
            if out.len() >= limit {
                break;
            }
            let (key, value) = entry.backend()?;
            let id = PersonId::from_be_bytes(*key.value());
            out.push(self.codec.open(id, value.value())?);
        }
        Ok(out)
    }

    /// Runs `query` against the search projection and resolves the hits
    /// against the store, in projection rank order.
    ///
    /// Hits for ids the store no longer holds are skipped. A query without a
    /// limit gets the store's default limit.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Person>> {
        let limit = query.limit.unwrap_or(self.default_limit);
        let query = query.clone().limit(limit);
        let hits = self.projection.search(&query)?;

        let r = self.read_txn()?;
        let people = r.open_table(PEOPLE).backend()?;
        let mut out = Vec::with_capacity(hits.len().min(limit));
        for hit in hits {
            if out.len() >= limit {
                break;
            }
            match self.codec.load(&people, hit.id)? {
                Some(person) => out.push(person),
                None => tracing::debug!(target: "projection", id = hit.id, "Skipping stale search hit"),
            }
        }
        Ok(out)
    }

    /// Pushes the plaintext view of a committed record to the projection.
    fn project(&self, person: &Person) {
        if let Err(e) = self.projection.index(person.id, &person.document()) {
            tracing::warn!(
                target: "projection",
                id = person.id,
                error = %e,
                "Failed to update search projection"
            );
        }
    }
}

/// The current UTC time truncated to whole seconds.
fn registration_time() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}
