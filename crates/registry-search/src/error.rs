use std::fmt;

/// Malformed tokenization: unterminated quote, escape, or extractor list,
/// or a `:` that does not follow a known field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} near byte {offset}")]
pub struct LexError {
    pub offset: usize,
    pub reason: String,
}

impl LexError {
    pub(crate) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Malformed query structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} near byte {position}")]
pub struct ParseError {
    pub position: usize,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

/// A query tree that the lexer and parser would never produce.
///
/// Only reachable for trees assembled by hand; treated as an internal fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid query tree: {reason}")]
pub struct CompileError {
    pub reason: String,
}

impl CompileError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Query syntax error: {0}")]
    Lex(#[from] LexError),

    #[error("Query parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Query compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Returns the user-facing report for errors caused by the query text.
    ///
    /// Compile errors are internal consistency faults and have no report.
    pub fn report(&self) -> Option<QueryErrorReport> {
        match self {
            Self::Lex(error) => Some(QueryErrorReport {
                offset: error.offset,
                message: error.reason.clone(),
            }),
            Self::Parse(error) => Some(QueryErrorReport {
                offset: error.position,
                message: error.reason.clone(),
            }),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<postcard::Error> for SearchError {
    fn from(error: postcard::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Structured description of the first lexical or parse failure in a query.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueryErrorReport {
    /// Byte offset into the query text.
    pub offset: usize,
    pub message: String,
}

impl QueryErrorReport {
    /// Renders the query with a caret line pointing at the failure.
    ///
    /// The caret column counts characters, not bytes, so it lines up under
    /// multi-byte text in a monospace display.
    pub fn render(&self, query: &str) -> String {
        let mut offset = self.offset.min(query.len());
        while !query.is_char_boundary(offset) {
            offset -= 1;
        }
        let column = query[..offset].chars().count();
        format!("{query}\n{}^ {}", " ".repeat(column), self.message)
    }
}

impl fmt::Display for QueryErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_and_parse_errors_produce_reports() {
        let lex = SearchError::from(LexError::new(3, "missing closing quote"));
        let report = lex.report().expect("lex report");
        assert_eq!(report.offset, 3);
        assert_eq!(report.message, "missing closing quote");

        let parse = SearchError::from(ParseError::new(0, "empty query"));
        assert_eq!(parse.report().map(|r| r.offset), Some(0));
    }

    #[test]
    fn compile_errors_have_no_report() {
        let error = SearchError::from(CompileError::new("empty needle"));
        assert!(error.report().is_none());
    }

    #[test]
    fn render_places_caret_under_offset() {
        let report = QueryErrorReport {
            offset: 4,
            message: "unmatched ')'".to_string(),
        };
        assert_eq!(report.render("a b )"), "a b )\n    ^ unmatched ')'");
    }

    #[test]
    fn render_counts_characters_for_multibyte_text() {
        let report = QueryErrorReport {
            offset: "é ".len(),
            message: "x".to_string(),
        };
        assert_eq!(report.render("é )"), "é )\n  ^ x");
    }

    #[test]
    fn display_is_single_line() {
        let report = QueryErrorReport {
            offset: 2,
            message: "empty group".to_string(),
        };
        assert_eq!(report.to_string(), "empty group (at byte 2)");
    }
}
