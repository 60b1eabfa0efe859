//! Compilation of query trees into reusable record predicates.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::CompileError;
use crate::types::SearchableRecord;

use super::context::RecordQueryContext;
use super::expression::{QueryNode, QueryTerm, TermScope};
use super::field::Field;
use super::text_match::NeedleMatcher;

/// A compiled, immutable predicate over records.
///
/// Cloning is cheap and clones share the compiled tree, so one predicate can
/// serve any number of concurrent evaluations.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    root: Arc<PredicateNode>,
    /// Needles every matching record contains somewhere.
    required: Arc<[NeedleMatcher]>,
}

#[derive(Debug)]
enum PredicateNode {
    Term(TermPredicate),
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
    Not(Box<PredicateNode>),
}

#[derive(Debug)]
struct TermPredicate {
    target: TermTarget,
    matcher: NeedleMatcher,
}

#[derive(Debug)]
enum TermTarget {
    Anywhere,
    Field(Field),
    Extractors(Vec<String>),
}

/// Compiles a query tree into a predicate.
///
/// Purely structural: no record is consulted.
pub fn compile(node: &QueryNode) -> Result<CompiledPredicate, CompileError> {
    let root = compile_node(node)?;
    let required = required_needles(&root)
        .into_iter()
        .map(|needle| NeedleMatcher::new(&needle))
        .collect::<Vec<_>>();

    Ok(CompiledPredicate {
        root: Arc::new(root),
        required: required.into(),
    })
}

fn compile_node(node: &QueryNode) -> Result<PredicateNode, CompileError> {
    match node {
        QueryNode::Term(term) => Ok(PredicateNode::Term(compile_term(term)?)),
        QueryNode::Not(inner) => Ok(PredicateNode::Not(Box::new(compile_node(inner)?))),
        QueryNode::And(parts) => Ok(PredicateNode::And(compile_operands(parts, "AND")?)),
        QueryNode::Or(parts) => Ok(PredicateNode::Or(compile_operands(parts, "OR")?)),
    }
}

fn compile_operands(parts: &[QueryNode], kind: &str) -> Result<Vec<PredicateNode>, CompileError> {
    if parts.len() < 2 {
        return Err(CompileError::new(format!(
            "{kind} node needs at least two operands, found {}",
            parts.len()
        )));
    }
    parts.iter().map(compile_node).collect()
}

fn compile_term(term: &QueryTerm) -> Result<TermPredicate, CompileError> {
    if term.text.is_empty() {
        return Err(CompileError::new("empty search term"));
    }
    let target = match &term.scope {
        TermScope::Any => TermTarget::Anywhere,
        TermScope::Field(field) => TermTarget::Field(*field),
        TermScope::Extractors(names) if names.is_empty() => {
            return Err(CompileError::new("extractor list without names"));
        }
        TermScope::Extractors(names) => TermTarget::Extractors(names.clone()),
    };

    Ok(TermPredicate {
        target,
        matcher: NeedleMatcher::new(&term.text),
    })
}

/// Needles required by every record the node accepts.
///
/// A conjunction requires the union of its operands' needles, a disjunction
/// only what all of its operands share, and a negation nothing.
fn required_needles(node: &PredicateNode) -> BTreeSet<String> {
    match node {
        PredicateNode::Term(term) => std::iter::once(term.matcher.needle().to_string()).collect(),
        PredicateNode::Not(_) => BTreeSet::new(),
        PredicateNode::And(parts) => parts.iter().fold(BTreeSet::new(), |mut acc, part| {
            acc.extend(required_needles(part));
            acc
        }),
        PredicateNode::Or(parts) => {
            let Some((first, rest)) = parts.split_first() else {
                return BTreeSet::new();
            };
            let mut required = required_needles(first);
            for part in rest {
                let other = required_needles(part);
                required = required.intersection(&other).cloned().collect();
            }
            required
        }
    }
}

impl CompiledPredicate {
    /// Evaluates the predicate against a record.
    pub fn matches(&self, record: &SearchableRecord) -> bool {
        self.matches_context(&RecordQueryContext::new(record))
    }

    /// Evaluates the predicate against a prepared record context.
    pub fn matches_context(&self, context: &RecordQueryContext) -> bool {
        evaluate_node(&self.root, context)
    }

    /// Cheap necessary condition: false means the record cannot match.
    pub fn may_match(&self, context: &RecordQueryContext) -> bool {
        self.required
            .iter()
            .all(|needle| needle.is_in(context.combined()))
    }

    /// Folded needles that every matching record contains.
    pub fn required_terms(&self) -> Vec<&str> {
        self.required.iter().map(NeedleMatcher::needle).collect()
    }
}

fn evaluate_node(node: &PredicateNode, context: &RecordQueryContext) -> bool {
    match node {
        PredicateNode::Term(term) => evaluate_term(term, context),
        PredicateNode::And(parts) => parts.iter().all(|part| evaluate_node(part, context)),
        PredicateNode::Or(parts) => parts.iter().any(|part| evaluate_node(part, context)),
        PredicateNode::Not(inner) => !evaluate_node(inner, context),
    }
}

fn evaluate_term(term: &TermPredicate, context: &RecordQueryContext) -> bool {
    match &term.target {
        TermTarget::Anywhere => context.matches_anywhere(&term.matcher),
        TermTarget::Field(field) => context.matches_field(*field, &term.matcher),
        TermTarget::Extractors(names) => context.matches_extractors(names, &term.matcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::QueryParser;
    use crate::types::MetadataEntry;
    use serde_json::json;

    fn predicate(query: &str) -> CompiledPredicate {
        compile(&QueryParser::parse(query).expect("parse")).expect("compile")
    }

    fn record(url: &str) -> SearchableRecord {
        SearchableRecord::new(url)
    }

    fn with_metadata(mut record: SearchableRecord, extractor: &str, content: serde_json::Value) -> SearchableRecord {
        record.insert_metadata(MetadataEntry::new(extractor, content));
        record
    }

    #[test]
    fn field_terms_are_case_insensitive() {
        assert!(predicate("url:github").matches(&record("https://GitHub.com/x")));
        assert!(predicate("url:GITHUB").matches(&record("https://github.com/x")));
    }

    #[test]
    fn non_ascii_terms_match_inside_words() {
        let greek = record("https://example.org/ΟΔΟΣΑ");
        assert!(predicate("ΟΔΟΣ").matches(&greek));
        assert!(predicate("url:οδοσ").matches(&greek));
        assert!(predicate("\"ΟΔΟΣΑ\"").matches(&greek));

        let cyrillic = record("https://example.org/ПРИВЕТ-мир");
        assert!(predicate("привет").matches(&cyrillic));
        assert!(predicate("МИР").matches(&cyrillic));
    }

    #[test]
    fn unrestricted_terms_are_substrings() {
        let mut rec = record("https://example.org");
        rec.head_describe = Some("v1.0.1-tax".to_string());
        assert!(predicate("ax").matches(&rec));
        assert!(!predicate("url:ax").matches(&rec));
    }

    #[test]
    fn unrestricted_terms_search_every_field() {
        let mut rec = record("u");
        rec.ds_id = Some("abc-123".to_string());
        rec.head = Some("deadbeef".to_string());
        rec.branches = vec!["develop".to_string()];
        rec.tags = vec!["0.1.0".to_string()];
        let rec = with_metadata(rec, "x", json!({"author": "Haxby"}));

        for needle in ["abc-1", "beef", "velo", "1.0", "haxby"] {
            assert!(predicate(needle).matches(&rec), "{needle} should match");
        }
        assert!(!predicate("nowhere").matches(&rec));
    }

    #[test]
    fn multi_valued_fields_match_any_element() {
        let mut rec = record("u");
        rec.tags = vec!["stable".to_string(), "archived-2020".to_string()];
        assert!(predicate("tags:archived").matches(&rec));
        assert!(!predicate("branches:archived").matches(&rec));
    }

    #[test]
    fn extractor_scope_only_consults_named_entries() {
        let rec = with_metadata(
            with_metadata(record("u"), "metalad_core", json!({"BIDSVersion": "1.0"})),
            "bids_dataset",
            json!({"Name": "x"}),
        );
        assert!(!predicate(r#"metadata[bids_dataset]:"BIDSVersion""#).matches(&rec));
        assert!(predicate(r#"metadata[metalad_core]:"BIDSVersion""#).matches(&rec));
        assert!(predicate(r#"metadata[bids_dataset,metalad_core]:"BIDSVersion""#).matches(&rec));
        assert!(predicate("metadata:bidsversion").matches(&rec));
        assert!(!predicate("metadata[missing]:x").matches(&rec));
    }

    #[test]
    fn escaped_metadata_phrase() {
        let rec = with_metadata(record("u"), "bids_dataset", json!({"BIDSVersion": "v1.2"}));
        assert!(predicate(r#"metadata[bids_dataset]:"\"BIDSVersion\": \"v""#).matches(&rec));
        assert!(!predicate(r#"metadata[bids_dataset]:"\"BIDSVersion\": \"1""#).matches(&rec));
    }

    #[test]
    fn negation_and_grouping() {
        let query = "(url:github.com OR url:gin.g-node) AND NOT tags:archived";
        let mut kept = record("https://gin.g-node.org/x");
        kept.tags = vec!["v1".to_string()];
        let mut dropped = record("https://gin.g-node.org/y");
        dropped.tags = vec!["archived".to_string()];
        let other = record("https://gitlab.com/z");

        let predicate = predicate(query);
        assert!(predicate.matches(&kept));
        assert!(!predicate.matches(&dropped));
        assert!(!predicate.matches(&other));
    }

    #[test]
    fn implicit_and_matches_like_explicit_and() {
        let implicit = predicate("James Haxby");
        let explicit = predicate("James AND Haxby");
        for url in ["james-haxby", "james", "haxby", "none"] {
            let rec = record(url);
            assert_eq!(implicit.matches(&rec), explicit.matches(&rec), "{url}");
        }
        assert!(implicit.matches(&record("james-haxby")));
        assert!(!implicit.matches(&record("james")));
    }

    #[test]
    fn required_terms() {
        assert_eq!(predicate("A b").required_terms(), vec!["a", "b"]);
        assert_eq!(predicate("(a b) OR (a c)").required_terms(), vec!["a"]);
        assert!(predicate("a OR b").required_terms().is_empty());
        assert_eq!(predicate("a NOT b").required_terms(), vec!["a"]);
        assert_eq!(predicate("url:Git").required_terms(), vec!["git"]);
    }

    #[test]
    fn may_match_is_a_necessary_condition() {
        let predicate = predicate("url:git tags:v1");
        let mut rec = record("https://github.com");
        rec.tags = vec!["v1".to_string()];
        let context = RecordQueryContext::new(&rec);
        assert!(predicate.may_match(&context));
        assert!(predicate.matches_context(&context));

        let context = RecordQueryContext::new(&record("https://github.com"));
        assert!(!predicate.may_match(&context));
    }

    #[test]
    fn invalid_trees_are_compile_errors() {
        let single_and = QueryNode::And(vec![QueryNode::Term(QueryTerm::any("a"))]);
        assert!(compile(&single_and).is_err());

        let empty_or = QueryNode::Or(Vec::new());
        assert!(compile(&empty_or).is_err());

        let empty_text = QueryNode::Term(QueryTerm::any(""));
        assert!(compile(&empty_text).is_err());

        let no_extractors = QueryNode::Term(QueryTerm::extractors(Vec::<String>::new(), "x"));
        assert!(compile(&no_extractors).is_err());
    }

    #[test]
    fn compiled_predicates_are_reusable() {
        let predicate = predicate("x");
        let clone = predicate.clone();
        let rec = record("xyz");
        assert_eq!(predicate.matches(&rec), clone.matches(&rec));
        assert_eq!(predicate.matches(&rec), predicate.matches(&rec));
    }
}
