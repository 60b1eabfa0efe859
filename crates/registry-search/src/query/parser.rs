//! Recursive-descent query parser.
//!
//! Grammar:
//!
//! ```text
//! sequence := unary ( (AND | OR)? unary )*
//! unary    := NOT unary | '(' sequence ')' | marker? term
//! marker   := FIELD ':' | 'metadata[' NAME (',' NAME)* ']:'
//! term     := WORD | PHRASE
//! ```
//!
//! Adjacent operands are joined by AND. Each sequence commits to one
//! operator kind; a second kind at the same level is an error rather than
//! being resolved by precedence.

use crate::error::{ParseError, Result};

use super::expression::{QueryNode, QueryTerm, TermScope};
use super::lexer::{tokenize, Token, TokenKind};

/// Deepest allowed nesting of groups and negations.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoolOp {
    And,
    Or,
}

/// Parses a token sequence into a query tree.
pub fn parse(tokens: Vec<Token>) -> std::result::Result<QueryNode, ParseError> {
    QueryParser::new(tokens).parse_query()
}

pub struct QueryParser {
    tokens: Vec<Token>,
    index: usize,
    /// Open groups and negations around the current position.
    depth: usize,
}

impl QueryParser {
    /// Tokenizes and parses raw query text.
    pub fn parse(input: &str) -> Result<QueryNode> {
        let tokens = tokenize(input)?;
        Ok(parse(tokens)?)
    }

    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
        }
    }

    fn parse_query(&mut self) -> std::result::Result<QueryNode, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new(0, "empty query"));
        }
        // A top-level sequence only stops at the end of input or on a stray ')'.
        self.parse_sequence(false)
    }

    fn parse_sequence(&mut self, in_group: bool) -> std::result::Result<QueryNode, ParseError> {
        let mut parts = vec![self.parse_unary()?];
        let mut committed: Option<BoolOp> = None;

        loop {
            let Some(token) = self.peek() else {
                break;
            };
            let position = token.offset;
            let explicit = match &token.kind {
                TokenKind::RParen if in_group => break,
                TokenKind::RParen => {
                    return Err(ParseError::new(position, "unmatched ')'"));
                }
                TokenKind::And => Some(BoolOp::And),
                TokenKind::Or => Some(BoolOp::Or),
                _ => None,
            };
            let op = match explicit {
                Some(op) => {
                    self.index += 1;
                    op
                }
                // Adjacent operands: implicit AND.
                None => BoolOp::And,
            };

            match committed {
                Some(existing) if existing != op => {
                    return Err(ParseError::new(
                        position,
                        "cannot mix AND and OR at the same level without parentheses",
                    ));
                }
                _ => committed = Some(op),
            }

            parts.push(self.parse_unary()?);
        }

        Ok(match (parts.len(), committed) {
            (1, _) => parts.remove(0),
            (_, Some(BoolOp::Or)) => QueryNode::Or(parts),
            _ => QueryNode::And(parts),
        })
    }

    fn parse_unary(&mut self) -> std::result::Result<QueryNode, ParseError> {
        let Some(token) = self.next() else {
            return Err(ParseError::new(
                self.end_position(),
                "expected search term but reached end of query",
            ));
        };

        match token.kind {
            TokenKind::Not => self.nested(token.offset, |parser| {
                Ok(QueryNode::negate(parser.parse_unary()?))
            }),
            TokenKind::LParen => {
                self.nested(token.offset, |parser| parser.parse_group(token.offset))
            }
            TokenKind::RParen => Err(ParseError::new(token.offset, "unexpected ')'")),
            TokenKind::And | TokenKind::Or => Err(ParseError::new(
                token.offset,
                format!("expected search term before '{}'", token.text),
            )),
            TokenKind::Word(_) | TokenKind::Phrase(_) => {
                Ok(QueryNode::Term(term_from_token(token, TermScope::Any)?))
            }
            TokenKind::FieldMarker(field) => {
                let term = self.marked_term(&token)?;
                Ok(QueryNode::Term(term_from_token(term, TermScope::Field(field))?))
            }
            TokenKind::ExtractorList(ref names) => {
                let scope = TermScope::Extractors(names.clone());
                let term = self.marked_term(&token)?;
                Ok(QueryNode::Term(term_from_token(term, scope)?))
            }
        }
    }

    fn parse_group(&mut self, open_position: usize) -> std::result::Result<QueryNode, ParseError> {
        if matches!(self.peek().map(|token| &token.kind), Some(TokenKind::RParen)) {
            return Err(ParseError::new(open_position, "empty group"));
        }
        if self.peek().is_none() {
            return Err(ParseError::new(open_position, "missing closing ')'"));
        }

        let inner = self.parse_sequence(true)?;
        match self.next() {
            Some(token) if token.kind == TokenKind::RParen => Ok(inner),
            _ => Err(ParseError::new(open_position, "missing closing ')'")),
        }
    }

    fn nested<T>(
        &mut self,
        position: usize,
        parse: impl FnOnce(&mut Self) -> std::result::Result<T, ParseError>,
    ) -> std::result::Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new(position, "query nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Takes the term that must follow a field or extractor marker.
    fn marked_term(&mut self, marker: &Token) -> std::result::Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind.is_term() => {
                let token = token.clone();
                self.index += 1;
                Ok(token)
            }
            _ => Err(ParseError::new(
                marker.offset,
                format!("'{}' must be followed by a search term", marker.text),
            )),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        Some(token)
    }

    fn end_position(&self) -> usize {
        self.tokens
            .last()
            .map(|token| token.offset + token.text.len())
            .unwrap_or_default()
    }
}

fn term_from_token(token: Token, scope: TermScope) -> std::result::Result<QueryTerm, ParseError> {
    let text = match token.kind {
        TokenKind::Word(text) | TokenKind::Phrase(text) => text,
        _ => {
            return Err(ParseError::new(token.offset, "expected search term"));
        }
    };
    if text.is_empty() {
        return Err(ParseError::new(token.offset, "empty search term"));
    }
    Ok(QueryTerm::new(text, scope))
}
