// Path: crates/storage/src/index.rs
//! Secondary index maintenance.
//!
//! An [`IndexPlan`] is the list of name/birth index writes that keeps both
//! indexes in step with one primary-record change. Plans are computed from
//! the old and new versions of a person and applied inside the caller's
//! write transaction; any failure, including a name conflict, leaves the
//! transaction to be dropped uncommitted.

use crate::tables::{k_birth, parse_id, v_id, BackendExt, BIRTH_INDEX, NAME_INDEX};
use persona_crypto::blind_index::NAME_DIGEST_LEN;
use persona_crypto::NameDigest;
use persona_types::{BirthDate, Person, PersonId, Result, StoreError};
use redb::{ReadableTable, WriteTransaction};

/// A single index write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOp {
    /// Map a name digest to `id`, rejecting a digest already held by another id.
    PutName {
        /// Blind index of the trimmed name.
        digest: [u8; NAME_DIGEST_LEN],
        /// Owner of the entry.
        id: PersonId,
    },
    /// Drop the name entry owned by `id`.
    DeleteName {
        /// Blind index of the trimmed name.
        digest: [u8; NAME_DIGEST_LEN],
        /// Expected owner of the entry.
        id: PersonId,
    },
    /// Add the `(birth, id)` entry.
    PutBirth {
        /// Date part of the key.
        birth: BirthDate,
        /// Id part of the key and the value.
        id: PersonId,
    },
    /// Drop the `(birth, id)` entry.
    DeleteBirth {
        /// Date part of the key.
        birth: BirthDate,
        /// Id part of the key.
        id: PersonId,
    },
}

/// Ordered index writes for one record change. Deletions precede insertions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPlan {
    ops: Vec<IndexOp>,
}

impl IndexPlan {
    /// Computes the writes that move the indexes from `old` to `new`.
    /// `old == None` is a create.
    pub fn plan(names: &NameDigest, old: Option<&Person>, new: &Person) -> Self {
        match old {
            None => Self::for_create(names, new),
            Some(old) => Self::for_update(names, old, new),
        }
    }

    /// Both entries for a fresh record.
    pub fn for_create(names: &NameDigest, new: &Person) -> Self {
        Self {
            ops: vec![
                IndexOp::PutName {
                    digest: names.digest(&new.name),
                    id: new.id,
                },
                IndexOp::PutBirth {
                    birth: new.birth,
                    id: new.id,
                },
            ],
        }
    }

    /// Only the entries whose indexed field changed.
    pub fn for_update(names: &NameDigest, old: &Person, new: &Person) -> Self {
        let mut deletes = Vec::new();
        let mut puts = Vec::new();
        if old.name.trim() != new.name.trim() {
            deletes.push(IndexOp::DeleteName {
                digest: names.digest(&old.name),
                id: old.id,
            });
            puts.push(IndexOp::PutName {
                digest: names.digest(&new.name),
                id: new.id,
            });
        }
        if old.birth != new.birth {
            deletes.push(IndexOp::DeleteBirth {
                birth: old.birth,
                id: old.id,
            });
            puts.push(IndexOp::PutBirth {
                birth: new.birth,
                id: new.id,
            });
        }
        deletes.extend(puts);
        Self { ops: deletes }
    }

    /// Both entries of a record being deleted.
    pub fn for_removal(names: &NameDigest, old: &Person) -> Self {
        Self {
            ops: vec![
                IndexOp::DeleteName {
                    digest: names.digest(&old.name),
                    id: old.id,
                },
                IndexOp::DeleteBirth {
                    birth: old.birth,
                    id: old.id,
                },
            ],
        }
    }

    /// The planned writes, in application order.
    pub fn ops(&self) -> &[IndexOp] {
        &self.ops
    }

    /// True when the change touches no indexed field.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every write inside `txn`. Stops at the first failure, which the
    /// caller propagates so the transaction is never committed.
    pub(crate) fn apply(&self, txn: &WriteTransaction<'_>) -> Result<()> {
        if self.ops.is_empty() {
            return Ok(());
        }
        let mut names = txn.open_table(NAME_INDEX).backend()?;
        let mut births = txn.open_table(BIRTH_INDEX).backend()?;

        for op in &self.ops {
            match op {
                IndexOp::PutName { digest, id } => {
                    let holder = names
                        .get(digest)
                        .backend()?
                        .map(|v| parse_id(v.value()))
                        .transpose()?;
                    if let Some(existing_id) = holder.filter(|h| h != id) {
                        return Err(StoreError::Conflict { existing_id });
                    }
                    names.insert(digest, v_id(*id).as_str()).backend()?;
                }
                IndexOp::DeleteName { digest, id } => {
                    let holder = names
                        .get(digest)
                        .backend()?
                        .map(|v| parse_id(v.value()))
                        .transpose()?;
                    match holder {
                        Some(h) if h == *id => {
                            names.remove(digest).backend()?;
                        }
                        Some(h) => tracing::warn!(
                            target: "storage",
                            id,
                            holder = h,
                            "Name index entry belongs to another record; left in place"
                        ),
                        None => tracing::warn!(target: "storage", id, "Name index entry already missing"),
                    }
                }
                IndexOp::PutBirth { birth, id } => {
                    births
                        .insert(k_birth(*birth, *id).as_str(), v_id(*id).as_str())
                        .backend()?;
                }
                IndexOp::DeleteBirth { birth, id } => {
                    let removed = births.remove(k_birth(*birth, *id).as_str()).backend()?;
                    if removed.is_none() {
                        tracing::warn!(target: "storage", id, "Birth index entry already missing");
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_types::PersonDraft;
    use time::OffsetDateTime;

    fn names() -> NameDigest {
        NameDigest::new(&[7; 32])
    }

    fn person(id: PersonId, name: &str, birth: &str) -> Person {
        PersonDraft::new(name, birth)
            .validate()
            .unwrap()
            .into_person(id, OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn create_puts_both_entries() {
        let p = person(1, "Alice", "1994-05-01");
        let plan = IndexPlan::plan(&names(), None, &p);
        assert_eq!(
            plan.ops(),
            &[
                IndexOp::PutName {
                    digest: names().digest("Alice"),
                    id: 1
                },
                IndexOp::PutBirth {
                    birth: p.birth,
                    id: 1
                },
            ]
        );
    }

    #[test]
    fn update_touches_only_changed_fields() {
        let old = person(4, "Dave", "1983-11-30");

        let same = IndexPlan::for_update(&names(), &old, &old.clone());
        assert!(same.is_empty());

        let renamed = person(4, "David", "1983-11-30");
        let plan = IndexPlan::for_update(&names(), &old, &renamed);
        assert_eq!(plan.ops().len(), 2);
        assert!(matches!(plan.ops()[0], IndexOp::DeleteName { id: 4, .. }));
        assert!(matches!(plan.ops()[1], IndexOp::PutName { id: 4, .. }));

        let moved = person(4, "David", "1984-01-01");
        let plan = IndexPlan::plan(&names(), Some(&old), &moved);
        let kinds: Vec<_> = plan
            .ops()
            .iter()
            .map(|op| match op {
                IndexOp::PutName { .. } => "put_name",
                IndexOp::DeleteName { .. } => "delete_name",
                IndexOp::PutBirth { .. } => "put_birth",
                IndexOp::DeleteBirth { .. } => "delete_birth",
            })
            .collect();
        assert_eq!(kinds, ["delete_name", "delete_birth", "put_name", "put_birth"]);
    }

    #[test]
    fn removal_deletes_both_entries() {
        let old = person(2, "Bob", "1998-03-15");
        let plan = IndexPlan::for_removal(&names(), &old);
        assert_eq!(
            plan.ops(),
            &[
                IndexOp::DeleteName {
                    digest: names().digest("Bob"),
                    id: 2
                },
                IndexOp::DeleteBirth {
                    birth: old.birth,
                    id: 2
                },
            ]
        );
    }

    #[test]
    fn apply_rejects_name_held_by_another_id() {
        let dir = tempfile::tempdir().unwrap();
        let db = redb::Database::create(dir.path().join("idx.redb")).unwrap();

        let w = db.begin_write().unwrap();
        IndexPlan::for_create(&names(), &person(1, "Alice", "1994-05-01"))
            .apply(&w)
            .unwrap();
        w.commit().unwrap();

        let w = db.begin_write().unwrap();
        let err = IndexPlan::for_create(&names(), &person(2, " Alice ", "2000-01-01"))
            .apply(&w)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { existing_id: 1 }));
        drop(w);

        let r = db.begin_read().unwrap();
        assert_eq!(r.open_table(BIRTH_INDEX).unwrap().len().unwrap(), 1);
    }
}
