// Path: crates/storage/src/allocator.rs
//! Monotonic record identifiers backed by the `people_id` counter.
//!
//! The counter holds the highest id ever handed out as a decimal string. It
//! lives inside the same write transaction as the record it serves, so redb's
//! single-writer lock serializes allocation and an aborted transaction
//! consumes nothing.

use crate::tables::{BackendExt, LAST_ID_KEY, PEOPLE_ID};
use persona_types::{PersonId, Result, StoreError};
use redb::{ReadTransaction, ReadableTable, WriteTransaction};

/// Allocates the next id: one more than the stored counter, or 1 for an
/// empty store. The new value is written back before returning.
pub fn next_id(txn: &WriteTransaction<'_>) -> Result<PersonId> {
    let mut table = txn.open_table(PEOPLE_ID).backend()?;
    let last = match table.get(LAST_ID_KEY).backend()? {
        Some(raw) => parse_counter(raw.value())?,
        None => 0,
    };
    let next = last
        .checked_add(1)
        .ok_or_else(|| StoreError::Corrupt("id counter overflow".into()))?;
    table.insert(LAST_ID_KEY, next.to_string().as_str()).backend()?;
    Ok(next)
}

/// The highest id allocated so far, `None` for a store that never allocated.
pub fn peek_last_id(txn: &ReadTransaction<'_>) -> Result<Option<PersonId>> {
    let table = txn.open_table(PEOPLE_ID).backend()?;
    let raw = table.get(LAST_ID_KEY).backend()?;
    raw.map(|v| parse_counter(v.value())).transpose()
}

fn parse_counter(raw: &str) -> Result<PersonId> {
    raw.parse().map_err(|_| {
        StoreError::Corrupt(format!("id counter holds '{raw}', expected a decimal integer"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::Database;

    fn db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::create(dir.path().join("ids.redb")).unwrap();
        (dir, db)
    }

    fn set_counter(db: &Database, raw: &str) {
        let w = db.begin_write().unwrap();
        w.open_table(PEOPLE_ID)
            .unwrap()
            .insert(LAST_ID_KEY, raw)
            .unwrap();
        w.commit().unwrap();
    }

    #[test]
    fn starts_at_one_and_increments() {
        let (_dir, db) = db();
        let w = db.begin_write().unwrap();
        assert_eq!(next_id(&w).unwrap(), 1);
        assert_eq!(next_id(&w).unwrap(), 2);
        w.commit().unwrap();

        let r = db.begin_read().unwrap();
        assert_eq!(peek_last_id(&r).unwrap(), Some(2));
    }

    #[test]
    fn aborted_transaction_consumes_nothing() {
        let (_dir, db) = db();
        {
            let w = db.begin_write().unwrap();
            assert_eq!(next_id(&w).unwrap(), 1);
            w.abort().unwrap();
        }
        let w = db.begin_write().unwrap();
        assert_eq!(next_id(&w).unwrap(), 1);
    }

    #[test]
    fn unparseable_counter_is_corrupt() {
        let (_dir, db) = db();
        set_counter(&db, "forty-two");
        let w = db.begin_write().unwrap();
        assert!(matches!(next_id(&w), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn overflow_is_corrupt() {
        let (_dir, db) = db();
        set_counter(&db, &u64::MAX.to_string());
        let w = db.begin_write().unwrap();
        assert!(matches!(next_id(&w), Err(StoreError::Corrupt(ref m)) if m.contains("overflow")));
    }

    #[test]
    fn peek_on_fresh_store_is_none() {
        let (_dir, db) = db();
        let w = db.begin_write().unwrap();
        w.open_table(PEOPLE_ID).unwrap();
        w.commit().unwrap();
        let r = db.begin_read().unwrap();
        assert_eq!(peek_last_id(&r).unwrap(), None);
    }
}
