// Path: crates/api/src/search.rs

//! API for the external full-text search engine that holds the searchable
//! projection of person records.

use persona_types::{BirthDate, PersonDocument, PersonId, ProjectionError};
use serde::{Deserialize, Serialize};
use time::Date;

/// Result ordering for a [`SearchQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Highest score first, ties broken by ascending id.
    #[default]
    Relevance,
    /// Oldest birth date first, ties broken by ascending id.
    BirthAsc,
    /// Youngest birth date first, ties broken by ascending id.
    BirthDesc,
}

/// A structured query over the projected fields. Every criterion is optional;
/// an empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive name pattern. `*` matches any run of characters and
    /// `?` exactly one; a pattern with neither is a substring match.
    #[serde(default)]
    pub name: Option<String>,
    /// Case-insensitive exact gender match.
    #[serde(default)]
    pub gender: Option<String>,
    /// Inclusive lower birth bound.
    #[serde(default)]
    pub from: Option<BirthDate>,
    /// Inclusive upper birth bound.
    #[serde(default)]
    pub to: Option<BirthDate>,
    /// Result ordering.
    #[serde(default)]
    pub sort: SortOrder,
    /// Maximum number of hits; the store supplies its default when `None`.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Sets the name pattern.
    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    /// Sets the exact gender filter.
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Restricts births to `[from, to]`.
    pub fn born_between(mut self, from: BirthDate, to: BirthDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Restricts births to people aged `min_age..=max_age` full years on
    /// `today`. An empty age window yields a query that matches nothing.
    pub fn aged_between(self, min_age: u16, max_age: u16, today: Date) -> Self {
        match BirthDate::window_for_ages(min_age, max_age, today) {
            Some((from, to)) => self.born_between(from, to),
            None => self.born_between(BirthDate::LATEST, BirthDate::EARLIEST),
        }
    }

    /// Sets the ordering.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Caps the number of hits.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One ranked match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier shared with the primary record.
    pub id: PersonId,
    /// Relevance score; higher is better.
    pub score: f32,
}

/// The contract the person store consumes to keep its searchable projection
/// in step with committed writes.
///
/// Implementations are independently-failing collaborators: the store calls
/// `index`/`delete` only after its own transaction has committed and treats
/// failures as out-of-band divergence, repaired by a later write to the same
/// id or by a full rebuild.
pub trait SearchProjection: Send + Sync {
    /// Adds or replaces the document stored under `id`.
    fn index(&self, id: PersonId, document: &PersonDocument) -> Result<(), ProjectionError>;

    /// Removes the document stored under `id`. Removing an absent id succeeds.
    fn delete(&self, id: PersonId) -> Result<(), ProjectionError>;

    /// Drops every document. Used before a full rebuild.
    fn clear(&self) -> Result<(), ProjectionError>;

    /// Runs `query` and returns ranked document identifiers.
    fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProjectionError>;
}
