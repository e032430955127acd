//! Shared text helpers: structural tags and tokenization.

use std::sync::LazyLock;

use regex::Regex;

static SECTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]\n]*\]").expect("section tag pattern is valid"));

/// Returns `true` if the text contains anything besides whitespace.
#[must_use]
pub fn has_content(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Removes bracketed section tags such as `[Chorus]` or `[Verse 2: Artist]`.
///
/// # Examples
///
/// ```
/// use mirrorball_features::text::strip_section_tags;
///
/// assert_eq!(strip_section_tags("[Chorus]\nla la"), "\nla la");
/// ```
#[must_use]
pub fn strip_section_tags(text: &str) -> String {
    SECTION_TAG.replace_all(text, "").into_owned()
}

/// A piece of lyric text delimited by section tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedSpan<'a> {
    /// Tag content without brackets, or `None` for text before the first tag.
    pub tag: Option<&'a str>,
    pub text: &'a str,
}

/// Splits text on section tags, pairing each span with the tag preceding it.
///
/// # Examples
///
/// ```
/// use mirrorball_features::text::split_sections;
///
/// let spans = split_sections("intro\n[Verse 1]\nhello\n[Bridge]\nbye");
/// assert_eq!(spans.len(), 3);
/// assert_eq!(spans[0].tag, None);
/// assert_eq!(spans[1].tag, Some("Verse 1"));
/// assert_eq!(spans[2].text.trim(), "bye");
/// ```
#[must_use]
pub fn split_sections(text: &str) -> Vec<TaggedSpan<'_>> {
    let mut spans = vec![];
    let mut tag = None;
    let mut start = 0;
    for m in SECTION_TAG.find_iter(text) {
        spans.push(TaggedSpan {
            tag,
            text: &text[start..m.start()],
        });
        tag = Some(&text[m.start() + 1..m.end() - 1]);
        start = m.end();
    }
    spans.push(TaggedSpan {
        tag,
        text: &text[start..],
    });
    spans
}

/// Whitespace-delimited tokens of the raw text.
pub fn whitespace_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Lowercases a token and trims surrounding sentence punctuation.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    token
        .trim_matches(|c| matches!(c, '.' | ',' | '!' | '?'))
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_content() {
        assert!(!has_content(None));
        assert!(!has_content(Some("  \n\t")));
        assert!(has_content(Some("a")));
    }

    #[test]
    fn test_split_sections_without_tags() {
        let spans = split_sections("just words");
        assert_eq!(
            spans,
            [TaggedSpan {
                tag: None,
                text: "just words"
            }]
        );
    }

    #[test]
    fn test_unclosed_bracket_stays_on_its_line() {
        let text = "[Verse 1\nhello there\n[Chorus]\nla la";
        assert_eq!(strip_section_tags(text), "[Verse 1\nhello there\n\nla la");
        let spans = split_sections(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "[Verse 1\nhello there\n");
        assert_eq!(spans[1].tag, Some("Chorus"));
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("Hello!"), "hello");
        assert_eq!(normalize_token("...why?"), "why");
        assert_eq!(normalize_token("don't"), "don't");
    }
}
