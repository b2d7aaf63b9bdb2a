// Path: crates/cli/src/commands/query.rs

use crate::util::print_json;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use persona_api::{SearchQuery, SortOrder};
use persona_storage::PersonStore;
use persona_types::BirthDate;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Relevance,
    BirthAsc,
    BirthDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Relevance => SortOrder::Relevance,
            SortArg::BirthAsc => SortOrder::BirthAsc,
            SortArg::BirthDesc => SortOrder::BirthDesc,
        }
    }
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Name pattern; `*` and `?` are wildcards, plain text matches substrings.
    #[clap(long)]
    pub name: Option<String>,
    /// Exact gender, case-insensitive.
    #[clap(long)]
    pub gender: Option<String>,
    /// Earliest birth date, inclusive.
    #[clap(long)]
    pub from: Option<BirthDate>,
    /// Latest birth date, inclusive.
    #[clap(long)]
    pub to: Option<BirthDate>,
    /// Youngest age in full years, as of today (UTC).
    #[clap(long, conflicts_with_all = ["from", "to"])]
    pub min_age: Option<u16>,
    /// Oldest age in full years, as of today (UTC).
    #[clap(long, conflicts_with_all = ["from", "to"])]
    pub max_age: Option<u16>,
    #[clap(long, value_enum, default_value_t = SortArg::Relevance)]
    pub sort: SortArg,
    /// Maximum number of results; the configured default applies otherwise.
    #[clap(long)]
    pub limit: Option<usize>,
}

impl SearchArgs {
    fn into_query(self, today: Date) -> SearchQuery {
        let query = SearchQuery {
            name: self.name,
            gender: self.gender,
            from: self.from,
            to: self.to,
            sort: self.sort.into(),
            limit: self.limit,
        };
        if self.min_age.is_none() && self.max_age.is_none() {
            return query;
        }
        query.aged_between(
            self.min_age.unwrap_or(0),
            self.max_age.unwrap_or(u16::MAX),
            today,
        )
    }
}

pub fn find_name(store: &PersonStore, name: &str) -> Result<()> {
    print_json(&store.find_by_name(name)?)
}

pub fn find_birth(store: &PersonStore, from: &str, to: &str) -> Result<()> {
    print_json(&store.find_by_birth_range(from, to)?)
}

pub fn find_age(store: &PersonStore, min_age: u16, max_age: u16) -> Result<()> {
    print_json(&store.find_by_age_range(min_age, max_age)?)
}

pub fn search(store: &PersonStore, args: SearchArgs) -> Result<()> {
    let query = args.into_query(OffsetDateTime::now_utc().date());
    print_json(&store.search(&query)?)
}

pub fn list(store: &PersonStore, limit: Option<usize>) -> Result<()> {
    print_json(&store.list(limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn parse(args: &[&str]) -> SearchArgs {
        let mut argv = vec!["search"];
        argv.extend_from_slice(args);
        SearchArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn age_flags_become_birth_bounds() {
        let query = parse(&["--min-age", "30", "--max-age", "39"]).into_query(date!(2024 - 06 - 15));
        assert_eq!(query.from.map(|d| d.to_string()).as_deref(), Some("1984-06-16"));
        assert_eq!(query.to.map(|d| d.to_string()).as_deref(), Some("1994-06-15"));
    }

    #[test]
    fn open_ended_age_range() {
        let query = parse(&["--min-age", "18"]).into_query(date!(2024 - 06 - 15));
        assert_eq!(query.from, Some(BirthDate::EARLIEST));
        assert_eq!(query.to.map(|d| d.to_string()).as_deref(), Some("2006-06-15"));
    }

    #[test]
    fn without_age_flags_dates_pass_through() {
        let query = parse(&["--from", "1990-01-01", "--name", "a*"]).into_query(date!(2024 - 06 - 15));
        assert_eq!(query.from.map(|d| d.to_string()).as_deref(), Some("1990-01-01"));
        assert_eq!(query.to, None);
        assert_eq!(query.name.as_deref(), Some("a*"));
    }

    #[test]
    fn age_flags_conflict_with_dates() {
        let argv = ["search", "--min-age", "18", "--from", "1990-01-01"];
        assert!(SearchArgs::try_parse_from(argv).is_err());
    }
}
