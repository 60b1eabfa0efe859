//! Case-folded record views for query matching.

use crate::types::SearchableRecord;

use super::field::Field;
use super::text_match::{fold_case, metadata_search_text, NeedleMatcher};

/// Query context for record matching.
///
/// Holds every searchable value of one record, case-folded once, so that a
/// predicate can be evaluated without touching the record again. Stores
/// keep one context per record and reuse it across queries.
#[derive(Debug, Clone)]
pub struct RecordQueryContext {
    url: String,
    ds_id: Option<String>,
    head: Option<String>,
    head_describe: Option<String>,
    branches: Vec<String>,
    tags: Vec<String>,
    /// (extractor name as registered, folded content text), ordered by name.
    metadata: Vec<(String, String)>,
    /// Every folded value joined by newlines.
    combined: String,
}

impl RecordQueryContext {
    pub fn new(record: &SearchableRecord) -> Self {
        let fold_all = |values: &[String]| values.iter().map(|v| fold_case(v)).collect::<Vec<_>>();

        let metadata = record
            .metadata_entries()
            .map(|entry| {
                let text = match metadata_search_text(&entry.content) {
                    Ok(text) => text,
                    Err(error) => {
                        tracing::warn!(
                            url = %record.url,
                            extractor = %entry.extractor_name,
                            "metadata content could not be rendered for search: {error}"
                        );
                        String::new()
                    }
                };
                (entry.extractor_name.clone(), fold_case(&text))
            })
            .collect::<Vec<_>>();

        let mut context = Self {
            url: fold_case(&record.url),
            ds_id: record.ds_id.as_deref().map(fold_case),
            head: record.head.as_deref().map(fold_case),
            head_describe: record.head_describe.as_deref().map(fold_case),
            branches: fold_all(&record.branches),
            tags: fold_all(&record.tags),
            metadata,
            combined: String::new(),
        };
        context.combined = context.all_values().collect::<Vec<_>>().join("\n");
        context
    }

    /// Every folded value of the record.
    fn all_values(&self) -> impl Iterator<Item = &str> {
        [Field::Url, Field::DsId, Field::Head, Field::HeadDescribe, Field::Branches, Field::Tags]
            .into_iter()
            .flat_map(|field| self.field_values(field))
            .chain(self.metadata.iter().map(|(_, text)| text.as_str()))
    }

    /// The folded values of one field; empty when the field is unset.
    pub fn field_values(&self, field: Field) -> Vec<&str> {
        match field {
            Field::Url => vec![self.url.as_str()],
            Field::DsId => self.ds_id.as_deref().into_iter().collect(),
            Field::Head => self.head.as_deref().into_iter().collect(),
            Field::HeadDescribe => self.head_describe.as_deref().into_iter().collect(),
            Field::Branches => self.branches.iter().map(String::as_str).collect(),
            Field::Tags => self.tags.iter().map(String::as_str).collect(),
            Field::Metadata => self.metadata.iter().map(|(_, text)| text.as_str()).collect(),
        }
    }

    /// Whether the needle occurs in any field or metadata entry.
    pub fn matches_anywhere(&self, matcher: &NeedleMatcher) -> bool {
        matcher.is_in_any(self.all_values())
    }

    /// Whether the needle occurs in the given field.
    pub fn matches_field(&self, field: Field, matcher: &NeedleMatcher) -> bool {
        matcher.is_in_any(self.field_values(field))
    }

    /// Whether the needle occurs in the entry of one of the named extractors.
    ///
    /// Names compare exactly; a missing entry simply does not match.
    pub fn matches_extractors(&self, names: &[String], matcher: &NeedleMatcher) -> bool {
        self.metadata
            .iter()
            .filter(|(name, _)| names.iter().any(|wanted| wanted == name))
            .any(|(_, text)| matcher.is_in(text))
    }

    /// All folded values joined, for cheap necessary-condition checks.
    pub fn combined(&self) -> &str {
        self.combined.as_str()
    }
}
