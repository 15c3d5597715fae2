//! Query intents the directory can issue against a record store.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::domain::{DepartmentId, FacultyRecord};

/// Search terms shorter than this (after trimming) fall back to the full listing.
pub const MIN_SEARCH_TERM_CHARS: usize = 2;

/// One of the mutually exclusive faculty reads. Every variant is ordered by
/// name ascending and carries the joined department name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacultyQuery {
    All,
    Search { term: String },
    Department(DepartmentId),
}

impl FacultyQuery {
    /// Builds the query for a raw search box value.
    pub fn for_search(raw: &str) -> Self {
        let term = raw.trim();
        if term.chars().count() < MIN_SEARCH_TERM_CHARS {
            return Self::All;
        }
        Self::Search {
            term: term.to_string(),
        }
    }

    pub fn for_selection(selection: DepartmentSelection) -> Self {
        match selection {
            DepartmentSelection::All => Self::All,
            DepartmentSelection::Department(department_id) => Self::Department(department_id),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Search { .. } => "search",
            Self::Department(_) => "department",
        }
    }

    /// Case-insensitive substring match over name, email and designation for
    /// searches; equality on the department key for filters.
    pub fn matches(&self, record: &FacultyRecord) -> bool {
        match self {
            Self::All => true,
            Self::Search { term } => {
                let needle = term.to_lowercase();
                [
                    Some(record.name.as_str()),
                    record.email.as_deref(),
                    Some(record.designation.as_str()),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            Self::Department(department_id) => record.department_id == *department_id,
        }
    }
}

/// Backslash-escapes `LIKE`/`ILIKE` metacharacters so a term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Department dropdown value: the `all` sentinel or a concrete department.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DepartmentSelection {
    #[default]
    All,
    Department(DepartmentId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid department selection '{0}': expected 'all' or a department id")]
pub struct InvalidDepartmentSelection(pub String);

impl FromStr for DepartmentSelection {
    type Err = InvalidDepartmentSelection;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value
            .parse::<i64>()
            .map(|id| Self::Department(DepartmentId(id)))
            .map_err(|_| InvalidDepartmentSelection(value.to_string()))
    }
}

impl fmt::Display for DepartmentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Department(department_id) => write!(f, "{department_id}"),
        }
    }
}
