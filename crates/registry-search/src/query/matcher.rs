//! Query matcher for search operations.

use crate::error::Result;
use crate::types::SearchableRecord;

use super::compile::{compile, CompiledPredicate};
use super::context::RecordQueryContext;
use super::expression::QueryNode;
use super::highlight::derive_highlight_terms;
use super::optimizer::optimize_expression;
use super::parser::QueryParser;

/// A compiled query matcher for search operations.
#[derive(Debug, Clone)]
pub struct SearchQueryMatcher {
    expression: QueryNode,
    predicate: CompiledPredicate,
}

impl SearchQueryMatcher {
    /// Compiles a raw query string into a matcher.
    ///
    /// The compilation pipeline:
    /// 1. Tokenize and parse the raw query string into a tree
    /// 2. Optimize the tree (flatten nested AND/OR, reorder by cost)
    /// 3. Compile the tree into a record predicate
    ///
    /// Either the whole query compiles or an error describing the first
    /// failure is returned.
    pub fn compile(raw_query: &str) -> Result<Self> {
        let parsed = QueryParser::parse(raw_query)?;
        Self::from_expression(parsed)
    }

    /// Compiles an already parsed tree.
    pub fn from_expression(parsed: QueryNode) -> Result<Self> {
        let expression = optimize_expression(parsed);
        let predicate = compile(&expression).inspect_err(|error| {
            tracing::error!(query = %expression, "query tree failed to compile: {error}");
        })?;

        tracing::debug!(
            query = %expression,
            terms = expression.term_count(),
            depth = expression.depth(),
            "compiled search query"
        );

        Ok(Self {
            expression,
            predicate,
        })
    }

    /// Returns the optimized expression.
    pub fn expression(&self) -> &QueryNode {
        &self.expression
    }

    pub fn predicate(&self) -> &CompiledPredicate {
        &self.predicate
    }

    /// Returns terms that should be highlighted in search results.
    pub fn highlight_terms(&self) -> Vec<String> {
        derive_highlight_terms(&self.expression)
    }

    pub fn matches(&self, record: &SearchableRecord) -> bool {
        self.predicate.matches(record)
    }

    /// Matches a prepared context, rejecting early on missing required terms.
    pub fn matches_context(&self, context: &RecordQueryContext) -> bool {
        self.predicate.may_match(context) && self.predicate.matches_context(context)
    }
}
