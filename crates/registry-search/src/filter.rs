//! Structured attribute filters applied alongside the text query.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::types::SearchableRecord;

/// Inclusive bounds over an optional numeric attribute.
///
/// A bound on an absent value never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl Range {
    pub fn between(min: u64, max: u64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: u64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: u64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: Option<u64>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(value) = value else {
            return false;
        };
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn validate(&self, name: &str) -> Result<()> {
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => Err(SearchError::InvalidInput(format!(
                "{name}: minimum {min} exceeds maximum {max}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Exact and range constraints over record attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub url: Option<String>,
    pub ds_id: Option<String>,
    pub annex_key_count: Range,
    pub annexed_files_in_wt_count: Range,
    pub annexed_files_in_wt_size: Range,
    pub git_objects_kb: Range,
    /// Bounds on the last update, unix seconds.
    pub last_update: Range,
    pub processed: Option<bool>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.annex_key_count.validate("annex_key_count")?;
        self.annexed_files_in_wt_count
            .validate("annexed_files_in_wt_count")?;
        self.annexed_files_in_wt_size
            .validate("annexed_files_in_wt_size")?;
        self.git_objects_kb.validate("git_objects_kb")?;
        self.last_update.validate("last_update")?;
        Ok(())
    }

    pub fn matches(&self, record: &SearchableRecord) -> bool {
        if let Some(url) = &self.url {
            if record.url != *url {
                return false;
            }
        }
        if let Some(ds_id) = &self.ds_id {
            let same = record
                .ds_id
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(ds_id));
            if !same {
                return false;
            }
        }
        if let Some(processed) = self.processed {
            if record.processed != processed {
                return false;
            }
        }

        self.annex_key_count.contains(record.annex_key_count)
            && self
                .annexed_files_in_wt_count
                .contains(record.annexed_files_in_wt_count)
            && self
                .annexed_files_in_wt_size
                .contains(record.annexed_files_in_wt_size)
            && self.git_objects_kb.contains(record.git_objects_kb)
            && self.last_update.contains(record.last_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SearchableRecord {
        let mut record = SearchableRecord::new("https://example.org/ds");
        record.ds_id = Some("2a0b4c1e-aaaa".to_string());
        record.annex_key_count = Some(40);
        record.git_objects_kb = Some(1024);
        record.last_update = Some(1_700_000_000);
        record.processed = true;
        record
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = RecordFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&record()));
        assert!(filter.matches(&SearchableRecord::new("x")));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(Range::between(40, 40).contains(Some(40)));
        assert!(Range::at_least(41).contains(Some(41)));
        assert!(!Range::at_least(41).contains(Some(40)));
        assert!(!Range::at_most(39).contains(Some(40)));
        assert!(Range::default().contains(None));
    }

    #[test]
    fn bounds_exclude_absent_values() {
        let filter = RecordFilter {
            annexed_files_in_wt_size: Range::at_least(0),
            ..RecordFilter::default()
        };
        assert!(!filter.matches(&record()));
    }

    #[test]
    fn exact_constraints() {
        let matching = RecordFilter {
            url: Some("https://example.org/ds".to_string()),
            ds_id: Some("2A0B4C1E-AAAA".to_string()),
            processed: Some(true),
            ..RecordFilter::default()
        };
        assert!(matching.matches(&record()));

        let wrong_url = RecordFilter {
            url: Some("https://example.org".to_string()),
            ..RecordFilter::default()
        };
        assert!(!wrong_url.matches(&record()));

        let unprocessed = RecordFilter {
            processed: Some(false),
            ..RecordFilter::default()
        };
        assert!(!unprocessed.matches(&record()));
    }

    #[test]
    fn combined_ranges() {
        let filter = RecordFilter {
            annex_key_count: Range::between(10, 50),
            git_objects_kb: Range::at_most(2048),
            last_update: Range::at_least(1_600_000_000),
            ..RecordFilter::default()
        };
        assert!(filter.matches(&record()));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let filter = RecordFilter {
            git_objects_kb: Range::between(10, 5),
            ..RecordFilter::default()
        };
        assert!(matches!(filter.validate(), Err(SearchError::InvalidInput(_))));
        assert!(RecordFilter::default().validate().is_ok());
    }
}
