//! Query expression types and AST nodes.

use std::fmt;

use super::field::Field;

/// A parsed query expression (AST node).
///
/// Parentheses only delimit nesting while parsing; a group's inner node
/// sits directly at the group's position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    Term(QueryTerm),
    /// Conjunction of at least two children.
    And(Vec<QueryNode>),
    /// Disjunction of at least two children.
    Or(Vec<QueryNode>),
    Not(Box<QueryNode>),
}

/// A single search term (leaf node in the AST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    /// The search text as written, case preserved.
    pub text: String,
    pub scope: TermScope,
}

/// Where a term is searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermScope {
    /// Every field and every metadata entry.
    Any,
    Field(Field),
    /// Metadata entries of the named extractors only.
    Extractors(Vec<String>),
}

impl QueryTerm {
    pub fn new(text: impl Into<String>, scope: TermScope) -> Self {
        Self {
            text: text.into(),
            scope,
        }
    }

    pub fn any(text: impl Into<String>) -> Self {
        Self::new(text, TermScope::Any)
    }

    pub fn field(field: Field, text: impl Into<String>) -> Self {
        Self::new(text, TermScope::Field(field))
    }

    pub fn extractors<I, S>(names: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            text,
            TermScope::Extractors(names.into_iter().map(Into::into).collect()),
        )
    }
}

impl QueryNode {
    pub fn term(term: QueryTerm) -> Self {
        Self::Term(term)
    }

    pub fn negate(node: QueryNode) -> Self {
        Self::Not(Box::new(node))
    }

    /// Visits every term in the tree, left to right.
    pub fn for_each_term<'a>(&'a self, visit: &mut impl FnMut(&'a QueryTerm)) {
        match self {
            Self::Term(term) => visit(term),
            Self::Not(inner) => inner.for_each_term(visit),
            Self::And(parts) | Self::Or(parts) => {
                for part in parts {
                    part.for_each_term(visit);
                }
            }
        }
    }

    pub fn term_count(&self) -> usize {
        let mut count = 0;
        self.for_each_term(&mut |_| count += 1);
        count
    }

    pub fn depth(&self) -> usize {
        match self {
            Self::Term(_) => 1,
            Self::Not(inner) => 1 + inner.depth(),
            Self::And(parts) | Self::Or(parts) => {
                1 + parts.iter().map(QueryNode::depth).max().unwrap_or(0)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical rendering
// ---------------------------------------------------------------------------

/// Renders the tree back into query syntax.
///
/// Every nested boolean node is parenthesized and every term is quoted, so
/// the output parses back into the same tree.
impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(term) => write!(f, "{term}"),
            Self::Not(inner) => {
                f.write_str("NOT ")?;
                write_operand(f, inner)
            }
            Self::And(parts) => write_joined(f, parts, " AND "),
            Self::Or(parts) => write_joined(f, parts, " OR "),
        }
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            TermScope::Any => {}
            TermScope::Field(field) => write!(f, "{field}:")?,
            TermScope::Extractors(names) => write!(f, "metadata[{}]:", names.join(","))?,
        }
        f.write_str("\"")?;
        for ch in self.text.chars() {
            if matches!(ch, '"' | '\\') {
                f.write_str("\\")?;
            }
            write!(f, "{ch}")?;
        }
        f.write_str("\"")
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[QueryNode], separator: &str) -> fmt::Result {
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            f.write_str(separator)?;
        }
        write_operand(f, part)?;
    }
    Ok(())
}

fn write_operand(f: &mut fmt::Formatter<'_>, node: &QueryNode) -> fmt::Result {
    match node {
        QueryNode::And(_) | QueryNode::Or(_) => write!(f, "({node})"),
        _ => write!(f, "{node}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any(text: &str) -> QueryNode {
        QueryNode::Term(QueryTerm::any(text))
    }

    #[test]
    fn renders_terms_with_scopes() {
        assert_eq!(any("x").to_string(), "\"x\"");
        assert_eq!(
            QueryNode::Term(QueryTerm::field(Field::Url, "github")).to_string(),
            "url:\"github\""
        );
        assert_eq!(
            QueryNode::Term(QueryTerm::extractors(["a", "b"], "v")).to_string(),
            "metadata[a,b]:\"v\""
        );
    }

    #[test]
    fn renders_escapes() {
        assert_eq!(any("say \"hi\" \\o/").to_string(), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn renders_nested_groups() {
        let node = QueryNode::And(vec![
            QueryNode::Or(vec![any("a"), any("b")]),
            QueryNode::negate(QueryNode::And(vec![any("c"), any("d")])),
        ]);
        assert_eq!(
            node.to_string(),
            r#"("a" OR "b") AND NOT ("c" AND "d")"#
        );
    }

    #[test]
    fn counts_terms_and_depth() {
        let node = QueryNode::Or(vec![
            any("a"),
            QueryNode::negate(QueryNode::And(vec![any("b"), any("c")])),
        ]);
        assert_eq!(node.term_count(), 3);
        assert_eq!(node.depth(), 4);
    }
}
