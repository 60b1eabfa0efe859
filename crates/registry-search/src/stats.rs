//! Statistics over a collection of dataset records.
//!
//! A record with a `ds_id` is a DataLad dataset. A record without one but
//! with a `git-annex` branch is a pure annex dataset. A record without a
//! `git-annex` branch is a non-annex dataset.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::SearchableRecord;

/// Totals over a set of annex datasets. Sums over no values are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnexDsCollectionStats {
    pub ds_count: usize,
    pub annexed_files_size: Option<u64>,
    pub annexed_file_count: Option<u64>,
}

impl AnnexDsCollectionStats {
    fn add(&mut self, size: Option<u64>, count: Option<u64>) {
        self.ds_count += 1;
        if let Some(size) = size {
            *self.annexed_files_size.get_or_insert(0) += size;
        }
        if let Some(count) = count {
            *self.annexed_file_count.get_or_insert(0) += count;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataladDsCollectionStats {
    /// One entry per distinct `ds_id`.
    pub unique_ds_stats: AnnexDsCollectionStats,
    /// Every record with a `ds_id`.
    pub stats: AnnexDsCollectionStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NonAnnexDsCollectionStats {
    pub ds_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub unique_ds_count: usize,
    pub ds_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub datalad_ds_stats: DataladDsCollectionStats,
    pub pure_annex_ds_stats: AnnexDsCollectionStats,
    pub non_annex_ds_stats: NonAnnexDsCollectionStats,
    pub summary: StatsSummary,
}

/// Computes statistics over a set of records.
pub fn collection_stats<'a, I>(records: I) -> CollectionStats
where
    I: IntoIterator<Item = &'a SearchableRecord>,
{
    let mut stats = CollectionStats::default();
    let mut by_ds_id: BTreeMap<&'a str, Vec<&'a SearchableRecord>> = BTreeMap::new();

    for record in records {
        stats.summary.ds_count += 1;

        match record.ds_id.as_deref() {
            Some(ds_id) => {
                stats.datalad_ds_stats.stats.add(
                    record.annexed_files_in_wt_size,
                    record.annexed_files_in_wt_count,
                );
                by_ds_id.entry(ds_id).or_default().push(record);
            }
            None if record.has_annex_branch() => {
                stats.pure_annex_ds_stats.add(
                    record.annexed_files_in_wt_size,
                    record.annexed_files_in_wt_count,
                );
            }
            None => {}
        }

        if !record.has_annex_branch() {
            stats.non_annex_ds_stats.ds_count += 1;
        }
    }

    for copies in by_ds_id.values() {
        let (size, count) = representative_copy(copies);
        stats.datalad_ds_stats.unique_ds_stats.add(size, count);
    }
    stats.summary.unique_ds_count = stats.datalad_ds_stats.unique_ds_stats.ds_count;

    stats
}

/// Picks the annexed size and file count representing one dataset.
///
/// The copies with the largest annexed size (or all copies when no size is
/// known) are considered, and the largest file count among them is used.
fn representative_copy(copies: &[&SearchableRecord]) -> (Option<u64>, Option<u64>) {
    let max_size = copies
        .iter()
        .filter_map(|record| record.annexed_files_in_wt_size)
        .max();
    let count = copies
        .iter()
        .filter(|record| max_size.is_none() || record.annexed_files_in_wt_size == max_size)
        .filter_map(|record| record.annexed_files_in_wt_count)
        .max();
    (max_size, count)
}
