//! Result ordering and pagination.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::SearchableRecord;

/// A named sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortKey {
    UrlAsc,
    UrlDesc,
    /// By annex key count.
    KeysAsc,
    KeysDesc,
    /// By last update time.
    UpdateAsc,
    #[default]
    UpdateDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::UrlAsc,
        SortKey::UrlDesc,
        SortKey::KeysAsc,
        SortKey::KeysDesc,
        SortKey::UpdateAsc,
        SortKey::UpdateDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UrlAsc => "url-asc",
            Self::UrlDesc => "url-desc",
            Self::KeysAsc => "keys-asc",
            Self::KeysDesc => "keys-desc",
            Self::UpdateAsc => "update-asc",
            Self::UpdateDesc => "update-desc",
        }
    }

    /// Compares two records. Absent values sort last in either direction.
    pub fn compare(self, left: &SearchableRecord, right: &SearchableRecord) -> Ordering {
        match self {
            Self::UrlAsc => left.url.cmp(&right.url),
            Self::UrlDesc => right.url.cmp(&left.url),
            Self::KeysAsc => compare_present_first(left.annex_key_count, right.annex_key_count, false),
            Self::KeysDesc => compare_present_first(left.annex_key_count, right.annex_key_count, true),
            Self::UpdateAsc => compare_present_first(left.last_update, right.last_update, false),
            Self::UpdateDesc => compare_present_first(left.last_update, right.last_update, true),
        }
    }
}

fn compare_present_first(left: Option<u64>, right: Option<u64>, descending: bool) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl FromStr for SortKey {
    type Err = SearchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| SearchError::InvalidInput(format!("unknown sort key: {value}")))
    }
}

impl TryFrom<String> for SortKey {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortKey> for String {
    fn from(key: SortKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Self {
        Self { number, size }
    }

    /// Checks the page number and clamps the size to `max_size`.
    pub fn normalized(self, max_size: usize) -> Result<Self, SearchError> {
        if self.number == 0 {
            return Err(SearchError::InvalidInput(
                "page numbers start at 1".to_string(),
            ));
        }
        if self.size == 0 {
            return Err(SearchError::InvalidInput(
                "page size must be positive".to_string(),
            ));
        }
        Ok(Self {
            number: self.number,
            size: self.size.min(max_size),
        })
    }

    /// Index range of this page within `total` items; empty past the end.
    pub fn bounds(&self, total: usize) -> std::ops::Range<usize> {
        let start = self
            .number
            .saturating_sub(1)
            .saturating_mul(self.size)
            .min(total);
        let end = start.saturating_add(self.size).min(total);
        start..end
    }

    pub fn page_count(&self, total: usize) -> usize {
        if self.size == 0 {
            return 0;
        }
        total.div_ceil(self.size)
    }
}
