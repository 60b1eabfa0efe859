//! Query tokenizer.
//!
//! Token text keeps its casing as written; case folding happens at match time.

use crate::error::LexError;

use super::field::Field;

const EXTRACTOR_LIST_PREFIX: &str = "metadata[";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text the token was read from.
    pub text: String,
    /// Byte offset of the token in the query.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    /// Quoted phrase with escapes resolved.
    Phrase(String),
    FieldMarker(Field),
    /// `metadata[a,b]:` with names in first-seen order.
    ExtractorList(Vec<String>),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl TokenKind {
    pub fn is_term(&self) -> bool {
        matches!(self, Self::Word(_) | Self::Phrase(_))
    }
}

/// Splits query text into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while let Some(ch) = input[cursor..].chars().next() {
        if ch.is_whitespace() {
            cursor += ch.len_utf8();
            continue;
        }

        let offset = cursor;
        let (kind, next_cursor) = match ch {
            '(' => (TokenKind::LParen, cursor + 1),
            ')' => (TokenKind::RParen, cursor + 1),
            '"' => {
                let (phrase, next) = consume_quoted_phrase(input, cursor)?;
                (TokenKind::Phrase(phrase), next)
            }
            ':' => {
                return Err(LexError::new(offset, "':' must follow a field name"));
            }
            _ if starts_with_ignore_ascii_case(&input[cursor..], EXTRACTOR_LIST_PREFIX) => {
                let (names, next) = consume_extractor_list(input, cursor)?;
                (TokenKind::ExtractorList(names), next)
            }
            _ => consume_word(input, cursor)?,
        };

        tokens.push(Token {
            kind,
            text: input[offset..next_cursor].to_string(),
            offset,
        });
        cursor = next_cursor;
    }

    Ok(tokens)
}

fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | ':' | '"')
}

fn starts_with_ignore_ascii_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn consume_word(input: &str, start: usize) -> Result<(TokenKind, usize), LexError> {
    let end = input[start..]
        .char_indices()
        .find(|(_, ch)| !is_word_char(*ch))
        .map(|(index, _)| start + index)
        .unwrap_or(input.len());
    let raw = &input[start..end];

    if input[end..].starts_with(':') {
        let field = Field::lookup(raw)
            .ok_or_else(|| LexError::new(start, format!("unknown field '{raw}'")))?;
        return Ok((TokenKind::FieldMarker(field), end + 1));
    }

    let kind = match raw {
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "NOT" => TokenKind::Not,
        _ => TokenKind::Word(raw.to_string()),
    };
    Ok((kind, end))
}

fn consume_extractor_list(input: &str, start: usize) -> Result<(Vec<String>, usize), LexError> {
    let list_start = start + EXTRACTOR_LIST_PREFIX.len();
    let Some(close) = input[list_start..].find(']').map(|index| list_start + index) else {
        return Err(LexError::new(start, "missing closing ']' in extractor list"));
    };

    let mut names: Vec<String> = Vec::new();
    for raw in input[list_start..close].split(',') {
        let name = raw.trim();
        if name.is_empty() {
            return Err(LexError::new(start, "empty extractor name in extractor list"));
        }
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }

    let after = close + 1;
    if !input[after..].starts_with(':') {
        return Err(LexError::new(after, "expected ':' after extractor list"));
    }
    Ok((names, after + 1))
}

fn consume_quoted_phrase(input: &str, start: usize) -> Result<(String, usize), LexError> {
    let mut phrase = String::new();
    let mut escape_at: Option<usize> = None;

    for (index, ch) in input[start + 1..].char_indices() {
        if escape_at.take().is_some() {
            phrase.push(ch);
            continue;
        }
        match ch {
            '\\' => escape_at = Some(start + 1 + index),
            '"' => return Ok((phrase, start + 1 + index + 1)),
            _ => phrase.push(ch),
        }
    }

    match escape_at {
        Some(position) => Err(LexError::new(position, "unterminated escape sequence")),
        None => Err(LexError::new(start, "missing closing quote")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .expect("tokenize")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn word(value: &str) -> TokenKind {
        TokenKind::Word(value.to_string())
    }

    #[test]
    fn words_and_operators() {
        assert_eq!(
            kinds("James AND Haxby OR NOT x"),
            vec![
                word("James"),
                TokenKind::And,
                word("Haxby"),
                TokenKind::Or,
                TokenKind::Not,
                word("x"),
            ]
        );
    }

    #[test]
    fn operators_are_case_sensitive() {
        assert_eq!(kinds("and Or nOT"), vec![word("and"), word("Or"), word("nOT")]);
    }

    #[test]
    fn parentheses_split_words() {
        assert_eq!(
            kinds("(a)b"),
            vec![TokenKind::LParen, word("a"), TokenKind::RParen, word("b")]
        );
    }

    #[test]
    fn offsets_and_raw_text_are_recorded() {
        let tokens = tokenize("  url:GitHub \"x y\"").expect("tokenize");
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[0].text, "url:");
        assert_eq!(tokens[1].offset, 6);
        assert_eq!(tokens[1].text, "GitHub");
        assert_eq!(tokens[2].offset, 13);
        assert_eq!(tokens[2].text, "\"x y\"");
    }

    #[test]
    fn field_markers() {
        assert_eq!(
            kinds("url:github tags:\"v1\" HEAD_DESCRIBE:tax"),
            vec![
                TokenKind::FieldMarker(Field::Url),
                word("github"),
                TokenKind::FieldMarker(Field::Tags),
                TokenKind::Phrase("v1".to_string()),
                TokenKind::FieldMarker(Field::HeadDescribe),
                word("tax"),
            ]
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let error = tokenize("a name:x").expect_err("unknown field");
        assert_eq!(error.offset, 2);
        assert!(error.reason.contains("unknown field 'name'"));
    }

    #[test]
    fn stray_colon_is_rejected() {
        let error = tokenize("(:x)").expect_err("stray colon");
        assert_eq!(error.offset, 1);
    }

    #[test]
    fn extractor_list() {
        assert_eq!(
            kinds("metadata[bids_dataset, metalad_core,bids_dataset]:\"BIDSVersion\""),
            vec![
                TokenKind::ExtractorList(vec![
                    "bids_dataset".to_string(),
                    "metalad_core".to_string()
                ]),
                TokenKind::Phrase("BIDSVersion".to_string()),
            ]
        );
    }

    #[test]
    fn extractor_list_errors() {
        let unterminated = tokenize("metadata[bids:x").expect_err("missing ]");
        assert_eq!(unterminated.offset, 0);

        let empty = tokenize("x metadata[a,,b]:y").expect_err("empty name");
        assert_eq!(empty.offset, 2);

        let no_colon = tokenize("metadata[a] y").expect_err("missing colon");
        assert_eq!(no_colon.offset, 11);
    }

    #[test]
    fn phrase_escapes() {
        assert_eq!(
            kinds(r#""\"BIDSVersion\": \"v""#),
            vec![TokenKind::Phrase("\"BIDSVersion\": \"v".to_string())]
        );
        assert_eq!(
            kinds(r#""a\\b\xc""#),
            vec![TokenKind::Phrase("a\\bxc".to_string())]
        );
    }

    #[test]
    fn phrase_keeps_reserved_characters() {
        assert_eq!(
            kinds("\"(a OR b): c\""),
            vec![TokenKind::Phrase("(a OR b): c".to_string())]
        );
    }

    #[test]
    fn unterminated_quote() {
        let error = tokenize("x \"unclosed").expect_err("unterminated");
        assert_eq!(error.offset, 2);
        assert_eq!(error.reason, "missing closing quote");
    }

    #[test]
    fn unterminated_escape() {
        let error = tokenize("\"abc\\").expect_err("unterminated escape");
        assert_eq!(error.offset, 4);
        assert_eq!(error.reason, "unterminated escape sequence");
    }

    #[test]
    fn multibyte_words() {
        assert_eq!(kinds("données ñ"), vec![word("données"), word("ñ")]);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(kinds("   ").is_empty());
    }
}
