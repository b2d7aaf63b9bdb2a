// Path: crates/types/src/person.rs

//! The person entity and the shapes it takes on its way in and out of the store.
//!
//! - [`PersonDraft`] is what callers hand to `create`/`update`: raw strings,
//!   plus the `id` and `registered_at` fields a full request body may carry.
//!   Those two are always ignored by the store.
//! - [`PersonFields`] is a validated, normalized draft.
//! - [`Person`] is the authoritative record.
//! - [`PersonDocument`] is the plaintext view pushed to the search projection.

use crate::error::StoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::macros::{date, format_description};
use time::{Date, Month, OffsetDateTime};

/// A person identifier. Allocated once, never reused.
pub type PersonId = u64;

/// Byte length of a rendered [`BirthDate`] (`YYYY-MM-DD`).
pub const BIRTH_DATE_LEN: usize = 10;

/// A calendar date rendered and parsed as ISO `YYYY-MM-DD`.
///
/// Years are restricted to `0000..=9999` so the rendered form is always
/// exactly [`BIRTH_DATE_LEN`] bytes, which the birth index relies on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BirthDate(Date);

impl BirthDate {
    /// The earliest representable date.
    pub const EARLIEST: Self = Self(date!(0000 - 01 - 01));
    /// The latest representable date.
    pub const LATEST: Self = Self(date!(9999 - 12 - 31));

    /// Builds a date from its components.
    pub fn from_calendar_date(year: i32, month: u8, day: u8) -> Result<Self, StoreError> {
        let month = Month::try_from(month)
            .map_err(|e| StoreError::Validation(format!("invalid birth month {month}: {e}")))?;
        let date = Date::from_calendar_date(year, month, day)
            .map_err(|e| StoreError::Validation(format!("invalid birth date: {e}")))?;
        Self::checked(date)
    }

    /// Returns the underlying calendar date.
    pub fn date(&self) -> Date {
        self.0
    }

    /// The inclusive birth window of everyone aged `min_age..=max_age` full
    /// years on `today`. A person whose birthday falls on `today` already
    /// counts as the new age; someone born on 29 February turns a year older
    /// on 1 March in common years.
    ///
    /// Returns `None` when `min_age > max_age` or nobody in the window can be
    /// born within the representable years.
    pub fn window_for_ages(min_age: u16, max_age: u16, today: Date) -> Option<(Self, Self)> {
        if min_age > max_age {
            return None;
        }
        let latest = years_before(today, min_age)?.min(Self::LATEST.0);
        let earliest = years_before(today, max_age.saturating_add(1))
            .and_then(Date::next_day)
            .map_or(Self::EARLIEST.0, |d| d.max(Self::EARLIEST.0));
        if latest < Self::EARLIEST.0 || earliest > latest {
            return None;
        }
        Some((Self(earliest), Self(latest)))
    }

    fn checked(date: Date) -> Result<Self, StoreError> {
        if !(0..=9999).contains(&date.year()) {
            return Err(StoreError::Validation(format!(
                "birth year {} is outside 0000-9999",
                date.year()
            )));
        }
        Ok(Self(date))
    }
}

/// The same calendar day `years` earlier, 29 February falling back to
/// 28 February in common years.
fn years_before(today: Date, years: u16) -> Option<Date> {
    let year = today.year() - i32::from(years);
    Date::from_calendar_date(year, today.month(), today.day())
        .or_else(|_| Date::from_calendar_date(year, today.month(), 28))
        .ok()
}

impl FromStr for BirthDate {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let date = Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
            .map_err(|e| StoreError::Validation(format!("invalid birth date '{trimmed}': {e}")))?;
        Self::checked(date)
    }
}

impl fmt::Display for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl fmt::Debug for BirthDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BirthDate({self})")
    }
}

impl Serialize for BirthDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BirthDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The authoritative person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Assigned by the store at creation.
    pub id: PersonId,
    /// Trimmed display name. Encrypted at rest.
    pub name: String,
    /// Free-form, optional.
    #[serde(default)]
    pub gender: Option<String>,
    /// Date of birth.
    pub birth: BirthDate,
    /// Stamped by the store at creation, whole seconds, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

impl Person {
    /// The plaintext view of this person for the search projection.
    pub fn document(&self) -> PersonDocument {
        PersonDocument {
            id: self.id,
            name: self.name.clone(),
            gender: self.gender.clone(),
            birth: self.birth,
        }
    }
}

/// Caller-supplied input for creating or replacing a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
    /// Ignored by the store; the identifier is allocated or taken from the path.
    #[serde(default)]
    pub id: Option<PersonId>,
    /// Required, surrounding whitespace is trimmed.
    #[serde(default)]
    pub name: String,
    /// Optional; blank is treated as absent.
    #[serde(default)]
    pub gender: Option<String>,
    /// Required, `YYYY-MM-DD`.
    #[serde(default)]
    pub birth: String,
    /// Ignored by the store; registration time is immutable.
    #[serde(default)]
    pub registered_at: Option<String>,
}

impl PersonDraft {
    /// A draft with the two required fields set.
    pub fn new(name: impl Into<String>, birth: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth: birth.into(),
            ..Self::default()
        }
    }

    /// Sets the gender.
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Checks required fields and normalizes the draft.
    pub fn validate(&self) -> Result<PersonFields, StoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name is required".into()));
        }
        if self.birth.trim().is_empty() {
            return Err(StoreError::Validation("birth is required".into()));
        }
        let birth = self.birth.parse()?;
        let gender = self
            .gender
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_owned);
        Ok(PersonFields {
            name: name.to_owned(),
            gender,
            birth,
        })
    }
}

/// A validated draft: trimmed name, normalized gender, parsed birth date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonFields {
    /// Trimmed, non-empty.
    pub name: String,
    /// `None` when the draft carried no gender or only whitespace.
    pub gender: Option<String>,
    /// Parsed date of birth.
    pub birth: BirthDate,
}

impl PersonFields {
    /// Binds the fields to a store-assigned identity.
    pub fn into_person(self, id: PersonId, registered_at: OffsetDateTime) -> Person {
        Person {
            id,
            name: self.name,
            gender: self.gender,
            birth: self.birth,
            registered_at,
        }
    }
}

/// The plaintext, queryable view of a person held by the search projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDocument {
    /// Same identifier as the primary record.
    pub id: PersonId,
    /// Queryable with wildcards.
    pub name: String,
    /// Queryable by exact match.
    pub gender: Option<String>,
    /// Queryable by range, sortable.
    pub birth: BirthDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_date_parses_and_renders_iso() {
        let date: BirthDate = "1990-01-31".parse().unwrap();
        assert_eq!(date.to_string(), "1990-01-31");
        assert_eq!(date.to_string().len(), BIRTH_DATE_LEN);
        assert_eq!(date, BirthDate::from_calendar_date(1990, 1, 31).unwrap());
    }

    #[test]
    fn birth_date_rejects_malformed_input() {
        for raw in ["", "1990-13-01", "1990-02-30", "1990/01/01", "90-01-01", "1990-1-1"] {
            let err = raw.parse::<BirthDate>().unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn birth_dates_order_chronologically() {
        let a: BirthDate = "1988-12-31".parse().unwrap();
        let b: BirthDate = "1989-01-01".parse().unwrap();
        assert!(a < b);
    }

    fn window(min: u16, max: u16, today: Date) -> Option<(String, String)> {
        BirthDate::window_for_ages(min, max, today).map(|(a, b)| (a.to_string(), b.to_string()))
    }

    #[test]
    fn age_window_counts_todays_birthday_as_the_new_age() {
        let today = date!(2024 - 06 - 15);
        assert_eq!(
            window(30, 30, today),
            Some(("1993-06-16".into(), "1994-06-15".into()))
        );
        assert_eq!(
            window(0, 0, today),
            Some(("2023-06-16".into(), "2024-06-15".into()))
        );
        assert_eq!(
            window(20, 29, today),
            Some(("1994-06-16".into(), "2004-06-15".into()))
        );
    }

    #[test]
    fn age_window_handles_leap_days() {
        let window = window(1, 1, date!(2024 - 02 - 29)).unwrap();
        assert_eq!(window, ("2022-03-01".into(), "2023-02-28".into()));

        // Born on a leap day: still 23 on 28 February of a common year.
        let (from, to) = BirthDate::window_for_ages(23, 23, date!(2023 - 02 - 28)).unwrap();
        let leapling: BirthDate = "2000-02-29".parse().unwrap();
        assert!(leapling > to);
        assert_eq!(from.to_string(), "1999-03-01");
    }

    #[test]
    fn age_window_rejects_inverted_and_clamps_extremes() {
        let today = date!(2024 - 06 - 15);
        assert_eq!(window(40, 30, today), None);
        assert_eq!(window(2025, 3000, today), None);
        let (from, _) = BirthDate::window_for_ages(0, u16::MAX, today).unwrap();
        assert_eq!(from, BirthDate::EARLIEST);
    }

    #[test]
    fn validate_trims_and_normalizes() {
        let draft = PersonDraft::new("  Alice  ", "1994-05-01").with_gender("   ");
        let fields = draft.validate().unwrap();
        assert_eq!(fields.name, "Alice");
        assert_eq!(fields.gender, None);
        assert_eq!(fields.birth.to_string(), "1994-05-01");
    }

    #[test]
    fn validate_requires_name_and_birth() {
        let err = PersonDraft::new("   ", "1994-05-01").validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("name")));

        let err = PersonDraft::new("Bob", "").validate().unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref m) if m.contains("birth")));
    }

    #[test]
    fn draft_accepts_full_person_bodies() {
        let json = r#"{"id":99,"name":"Eve","gender":"Female","birth":"2001-06-10","registered_at":"whatever"}"#;
        let draft: PersonDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.id, Some(99));
        assert_eq!(draft.validate().unwrap().gender.as_deref(), Some("Female"));
    }

    #[test]
    fn person_serializes_birth_as_string() {
        let person = PersonDraft::new("Carol", "1992-07-21")
            .validate()
            .unwrap()
            .into_person(3, OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["birth"], "1992-07-21");
        assert_eq!(json["registered_at"], "1970-01-01T00:00:00Z");

        let back: Person = serde_json::from_value(json).unwrap();
        assert_eq!(back, person);
        assert_eq!(back.document().birth, person.birth);
    }
}
