//! Case folding, substring matching and metadata text rendering.

use std::io;

use memchr::memmem;
use serde::Serialize;
use serde_json::Value;

/// Folds text for case-insensitive comparison.
///
/// Each character is lowercased on its own, so a folded needle stays a
/// substring of the folded text it was taken from (no final-sigma rule).
pub fn fold_case(value: &str) -> String {
    value.chars().flat_map(char::to_lowercase).collect()
}

/// A case-folded needle with a prebuilt substring searcher.
#[derive(Debug, Clone)]
pub struct NeedleMatcher {
    needle: String,
    finder: memmem::Finder<'static>,
}

impl NeedleMatcher {
    pub fn new(raw: &str) -> Self {
        let needle = fold_case(raw);
        let finder = memmem::Finder::new(needle.as_bytes()).into_owned();
        Self { needle, finder }
    }

    /// The folded needle.
    pub fn needle(&self) -> &str {
        self.needle.as_str()
    }

    /// Whether the needle occurs in an already folded haystack.
    pub fn is_in(&self, folded_haystack: &str) -> bool {
        self.finder.find(folded_haystack.as_bytes()).is_some()
    }

    /// Whether the needle occurs in any of the folded haystacks.
    pub fn is_in_any<'a, I>(&self, folded_haystacks: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        folded_haystacks
            .into_iter()
            .any(|haystack| self.is_in(haystack))
    }
}

// ---------------------------------------------------------------------------
// Metadata text rendering
// ---------------------------------------------------------------------------

/// Writes JSON the way the registry database renders `jsonb` as text:
/// `": "` after object keys and `", "` between members.
struct JsonbTextFormatter;

impl serde_json::ser::Formatter for JsonbTextFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Renders metadata content as the text that metadata terms search.
pub fn metadata_search_text(content: &Value) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, JsonbTextFormatter);
    content.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn needle_is_folded() {
        let matcher = NeedleMatcher::new("GitHub");
        assert_eq!(matcher.needle(), "github");
        assert!(matcher.is_in("https://github.com/x"));
        assert!(!matcher.is_in("https://gitlab.com/x"));
    }

    #[test]
    fn substring_not_whole_word() {
        let matcher = NeedleMatcher::new("ax");
        assert!(matcher.is_in("v1.0.1-tax"));
    }

    #[test]
    fn unicode_folding() {
        let matcher = NeedleMatcher::new("ÉTUDE");
        assert!(matcher.is_in(&fold_case("Une Étude")));
    }

    #[test]
    fn folding_ignores_word_position() {
        assert_eq!(fold_case("ΟΔΟΣ"), "οδοσ");
        assert_eq!(fold_case("ΟΔΟΣΑ"), "οδοσα");

        let matcher = NeedleMatcher::new("ΟΔΟΣ");
        assert!(matcher.is_in(&fold_case("https://example.org/ΟΔΟΣΑ")));
        assert!(matcher.is_in(&fold_case("ΟΔΟΣ")));
        assert!(!NeedleMatcher::new("ς").is_in(&fold_case("οδος")));
    }

    #[test]
    fn folding_handles_expanding_characters() {
        assert_eq!(fold_case("İstanbul"), "i\u{307}stanbul");
        assert!(NeedleMatcher::new("İST").is_in(&fold_case("İSTANBUL")));
        assert!(NeedleMatcher::new("straße").is_in(&fold_case("STRAßE 5")));
    }

    #[test]
    fn any_haystack() {
        let matcher = NeedleMatcher::new("dev");
        assert!(matcher.is_in_any(["master", "develop"]));
        assert!(!matcher.is_in_any(["master", "main"]));
        assert!(!matcher.is_in_any(Vec::<&str>::new()));
    }

    #[test]
    fn metadata_text_uses_spaced_separators() {
        let text = metadata_search_text(&json!({
            "BIDSVersion": "v1.0",
            "Authors": ["A", "B"],
            "nested": {"n": 1}
        }))
        .expect("render");
        assert_eq!(
            text,
            r#"{"Authors": ["A", "B"], "BIDSVersion": "v1.0", "nested": {"n": 1}}"#
        );
    }

    #[test]
    fn metadata_text_of_scalars_and_empties() {
        assert_eq!(metadata_search_text(&json!("x")).expect("render"), "\"x\"");
        assert_eq!(metadata_search_text(&json!({})).expect("render"), "{}");
        assert_eq!(metadata_search_text(&json!([])).expect("render"), "[]");
    }
}
