// Path: crates/search/src/memory.rs
use crate::pattern::NamePattern;
use parking_lot::RwLock;
use persona_api::{SearchHit, SearchProjection, SearchQuery, SortOrder};
use persona_types::{PersonDocument, PersonId, ProjectionError};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Score added when a gender filter is present and matched.
const GENDER_BOOST: f32 = 0.5;

/// An in-memory search projection.
///
/// Documents live in a map keyed by id behind a [`RwLock`]; queries scan every
/// document. Nothing survives the process, so owners rebuild it from the
/// authoritative store at startup.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    docs: RwLock<BTreeMap<PersonId, PersonDocument>>,
}

impl MemorySearchIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// The document indexed under `id`, if any.
    pub fn get(&self, id: PersonId) -> Option<PersonDocument> {
        self.docs.read().get(&id).cloned()
    }

    fn score(query: &SearchQuery, pattern: Option<&NamePattern>, doc: &PersonDocument) -> Option<f32> {
        let mut score = match pattern {
            Some(p) => p.matches(&doc.name)?.score(),
            None => 1.0,
        };
        if let Some(gender) = query.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            let matched = doc
                .gender
                .as_deref()
                .is_some_and(|g| g.trim().eq_ignore_ascii_case(gender));
            if !matched {
                return None;
            }
            score += GENDER_BOOST;
        }
        if query.from.is_some_and(|from| doc.birth < from) {
            return None;
        }
        if query.to.is_some_and(|to| doc.birth > to) {
            return None;
        }
        Some(score)
    }
}

impl SearchProjection for MemorySearchIndex {
    fn index(&self, id: PersonId, document: &PersonDocument) -> Result<(), ProjectionError> {
        if document.id != id {
            return Err(ProjectionError::Index {
                id,
                reason: format!("document carries id {}", document.id),
            });
        }
        self.docs.write().insert(id, document.clone());
        Ok(())
    }

    fn delete(&self, id: PersonId) -> Result<(), ProjectionError> {
        self.docs.write().remove(&id);
        Ok(())
    }

    fn clear(&self) -> Result<(), ProjectionError> {
        self.docs.write().clear();
        Ok(())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProjectionError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Ok(Vec::new());
            }
        }
        let pattern = query.name.as_deref().and_then(NamePattern::parse);

        let docs = self.docs.read();
        let mut matched: Vec<(&PersonDocument, f32)> = docs
            .values()
            .filter_map(|doc| Self::score(query, pattern.as_ref(), doc).map(|s| (doc, s)))
            .collect();

        matched.sort_by(|(a, sa), (b, sb)| {
            let primary = match query.sort {
                SortOrder::Relevance => sb.partial_cmp(sa).unwrap_or(Ordering::Equal),
                SortOrder::BirthAsc => a.birth.cmp(&b.birth),
                SortOrder::BirthDesc => b.birth.cmp(&a.birth),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let limit = query.limit.unwrap_or(usize::MAX);
        let hits: Vec<SearchHit> = matched
            .into_iter()
            .take(limit)
            .map(|(doc, score)| SearchHit { id: doc.id, score })
            .collect();
        tracing::debug!(target: "projection", hits = hits.len(), "Executed search query");
        Ok(hits)
    }
}
