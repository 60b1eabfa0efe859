//! Query parsing, compilation, and matching for registry search.
//!
//! This module provides the query language for dataset search, including:
//! - Tokenization (words, phrases, field markers, extractor lists, operators)
//! - Parsing into a boolean tree (AND/OR/NOT, implicit AND, grouping)
//! - Query optimization (flattening, double negation, reordering by cost)
//! - Compilation into reusable record predicates

mod compile;
mod context;
mod expression;
mod field;
mod highlight;
mod lexer;
mod matcher;
mod optimizer;
mod parser;
mod text_match;

// Re-export public types
pub use compile::{compile, CompiledPredicate};
pub use context::RecordQueryContext;
pub use expression::{QueryNode, QueryTerm, TermScope};
pub use field::Field;
pub use highlight::derive_highlight_terms;
pub use lexer::{tokenize, Token, TokenKind};
pub use matcher::SearchQueryMatcher;
pub use optimizer::optimize_expression;
pub use parser::{parse, QueryParser};
pub use text_match::{fold_case, metadata_search_text, NeedleMatcher};
