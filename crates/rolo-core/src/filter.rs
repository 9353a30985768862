//! Display filtering for contacts and fields
//!
//! Everything here borrows from the stored collections and returns views.
//! Stored order is never touched; sorting only reorders the returned refs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Contact, ContactField};

/// Ordering of fields by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Oldest first
    #[serde(rename = "asc")]
    Ascending,
    /// Newest first
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The other direction
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" | "oldest" => Ok(SortDirection::Ascending),
            "desc" | "descending" | "newest" => Ok(SortDirection::Descending),
            other => Err(format!("Unknown sort direction '{}' (use asc or desc)", other)),
        }
    }
}

/// Case-insensitive substring match; an empty needle matches everything
fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    needle_lower.is_empty() || haystack.to_lowercase().contains(needle_lower)
}

/// Contacts whose name contains `query`, optionally restricted to favorites
pub fn filter_contacts<'a>(
    contacts: &'a [Contact],
    query: &str,
    favorites_only: bool,
) -> Vec<&'a Contact> {
    let query = query.to_lowercase();
    contacts
        .iter()
        .filter(|c| contains_ignore_case(&c.name, &query))
        .filter(|c| !favorites_only || c.is_favorite)
        .collect()
}

/// Fields whose label or value contains `query`
pub fn filter_fields<'a>(fields: &'a [ContactField], query: &str) -> Vec<&'a ContactField> {
    let query = query.to_lowercase();
    fields
        .iter()
        .filter(|f| contains_ignore_case(&f.label, &query) || contains_ignore_case(&f.value, &query))
        .collect()
}

/// Sort field refs by creation time
///
/// The sort is stable, so fields created in the same instant keep
/// insertion order when ascending.
pub fn sort_fields(fields: &mut [&ContactField], direction: SortDirection) {
    match direction {
        SortDirection::Ascending => fields.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortDirection::Descending => fields.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Filter then sort in one step
pub fn visible_fields<'a>(
    fields: &'a [ContactField],
    query: &str,
    direction: SortDirection,
) -> Vec<&'a ContactField> {
    let mut visible = filter_fields(fields, query);
    sort_fields(&mut visible, direction);
    visible
}
