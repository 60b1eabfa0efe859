//! Highlight term extraction for search results.
//!
//! `derive_highlight_terms` approach:
//! - Collects the text of every term that can contribute to a match
//! - Skips terms under NOT, which never appear in accepted records
//! - Case-folds all terms
//! - Deduplicates using BTreeSet for sorted, unique output

use std::collections::BTreeSet;

use super::expression::{QueryNode, QueryTerm};
use super::text_match::fold_case;

/// Derives highlight terms from a query tree.
///
/// # Example
/// ```ignore
/// // "Haxby url:github" -> ["github", "haxby"]
/// // "a NOT b"          -> ["a"]
/// ```
pub fn derive_highlight_terms(node: &QueryNode) -> Vec<String> {
    let mut collector = HighlightCollector::default();
    collector.collect(node, false);
    collector.into_terms()
}

#[derive(Default)]
struct HighlightCollector {
    terms: BTreeSet<String>,
}

impl HighlightCollector {
    fn collect(&mut self, node: &QueryNode, negated: bool) {
        match node {
            QueryNode::Term(term) if !negated => self.push(term),
            QueryNode::Term(_) => {}
            QueryNode::Not(inner) => self.collect(inner, !negated),
            QueryNode::And(parts) | QueryNode::Or(parts) => {
                for part in parts {
                    self.collect(part, negated);
                }
            }
        }
    }

    fn push(&mut self, term: &QueryTerm) {
        let folded = fold_case(term.text.trim());
        if !folded.is_empty() {
            self.terms.insert(folded);
        }
    }

    fn into_terms(self) -> Vec<String> {
        self.terms.into_iter().collect()
    }
}
