//! Body text normalization and tokenization.
//!
//! Pure functions, no I/O: lower-case, strip markup, replace non-informative
//! unicode categories, then split into word-like tokens. The worker pool
//! calls [`normalize`] once per record and fingerprints the result before
//! tokenizing, so equal bodies always normalize to equal text.

use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// What the character filter does with a single char.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharAction {
    /// Pass through unchanged
    Keep,
    /// Replace with a single space (token boundary)
    Space,
    /// Drop entirely, gluing the neighbors together
    Delete,
}

/// Characters that would normally be replaced by a space but are deleted
/// instead: `@` and `.` keep email addresses in one token, `/` and `?`
/// keep URL paths in one token.
const GLUE_CHARS: [char; 4] = ['@', '.', '/', '?'];

fn char_action(c: char) -> CharAction {
    if GLUE_CHARS.contains(&c) {
        return CharAction::Delete;
    }

    // See https://www.unicode.org/reports/tr44/#General_Category_Values
    match c.general_category() {
        GeneralCategory::Control
        | GeneralCategory::Format
        | GeneralCategory::Surrogate
        | GeneralCategory::PrivateUse
        | GeneralCategory::Unassigned
        | GeneralCategory::LineSeparator
        | GeneralCategory::ParagraphSeparator
        | GeneralCategory::MathSymbol
        | GeneralCategory::CurrencySymbol
        | GeneralCategory::ModifierSymbol
        | GeneralCategory::OtherSymbol
        | GeneralCategory::ConnectorPunctuation
        | GeneralCategory::DashPunctuation
        | GeneralCategory::OpenPunctuation
        | GeneralCategory::ClosePunctuation
        | GeneralCategory::InitialPunctuation
        | GeneralCategory::FinalPunctuation
        | GeneralCategory::OtherPunctuation => CharAction::Space,
        _ => CharAction::Keep,
    }
}

/// Convert HTML to plain-ish text (markdown). Falls back to the input
/// unchanged when conversion fails, so malformed markup never errors out.
pub fn html_to_text(input: &str) -> String {
    htmd::convert(input).unwrap_or_else(|_| input.to_string())
}

/// Apply the character filter: non-informative categories become spaces,
/// glue characters disappear, everything else passes through.
pub fn clean_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match char_action(c) {
            CharAction::Keep => out.push(c),
            CharAction::Space => out.push(' '),
            CharAction::Delete => {}
        }
    }
    out
}

/// Normalize a raw message body: lower-case, strip markup, filter
/// characters. The result is the text that gets fingerprinted for
/// deduplication; [`tokens`] splits it into the final token stream.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let text = html_to_text(&lowered);
    clean_chars(&text)
}

/// Lazy iterator over the tokens of a normalized body.
///
/// Single-pass and non-restartable: call [`tokens`] again to re-iterate.
/// Tokens come out in original left-to-right order; purely-decimal and
/// purely-hexadecimal tokens are dropped as non-informative.
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let trimmed = self.rest.trim_start();
            if trimmed.is_empty() {
                self.rest = trimmed;
                return None;
            }
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            let (token, rest) = trimmed.split_at(end);
            self.rest = rest;
            if !is_decimal(token) && !is_hex(token) {
                return Some(token);
            }
        }
    }
}

/// Tokenize normalized text. See [`Tokens`].
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(text: &str) -> Vec<&str> {
        tokens(text).collect()
    }

    #[test]
    fn test_empty_body_yields_no_tokens() {
        assert!(collect(&normalize("")).is_empty());
        assert!(collect(&normalize("   \n\t  ")).is_empty());
    }

    #[test]
    fn test_email_addresses_stay_glued() {
        let text = clean_chars("write to a@b.com now");
        assert_eq!(collect(&text), vec!["write", "to", "abcom", "now"]);
    }

    #[test]
    fn test_url_paths_stay_glued() {
        let text = clean_chars("see http://a.b/c?x for details");
        // ':' is punctuation -> space; '/', '.', '?' are deleted and glue
        assert_eq!(collect(&text), vec!["see", "http", "abcx", "for", "details"]);
    }

    #[test]
    fn test_punctuation_becomes_token_boundary() {
        let text = clean_chars("one,two;three(four)");
        assert_eq!(collect(&text), vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_digit_and_hex_tokens_dropped() {
        assert_eq!(collect("year 2024 hash deadbeef word"), vec!["year", "hash", "word"]);
        // hex check is length >= 1, so even single hex letters go
        assert_eq!(collect("a b g"), vec!["g"]);
    }

    #[test]
    fn test_category_filtering_example() {
        // From the pipeline contract: ',', '!', ':' and '=' become spaces,
        // '@', '.', '/', '?' are deleted, digits and hex tokens dropped.
        let cleaned = clean_chars(
            "hello, world! visit http://a.b/c?x=1 or email me@x.com 2024 deadbeef",
        );
        assert_eq!(
            collect(&cleaned),
            vec!["hello", "world", "visit", "http", "abcx", "or", "email", "mexcom"],
        );
    }

    #[test]
    fn test_normalize_lowercases() {
        let text = normalize("Hello WORLD");
        assert_eq!(collect(&text), vec!["hello", "world"]);
    }

    #[test]
    fn test_normalize_strips_markup() {
        let text = normalize("<html><body><p>Hello <b>there</b></p></body></html>");
        assert_eq!(collect(&text), vec!["hello", "there"]);
    }

    #[test]
    fn test_control_and_symbol_categories_replaced() {
        // U+0007 control, U+20AC currency, U+2028 line separator
        let text = clean_chars("a\u{0007}b\u{20AC}c\u{2028}d");
        assert_eq!(text, "a b c d");
    }

    #[test]
    fn test_tokens_single_pass_order() {
        let mut it = tokens("alpha  beta\tgamma");
        assert_eq!(it.next(), Some("alpha"));
        assert_eq!(it.next(), Some("beta"));
        assert_eq!(it.next(), Some("gamma"));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    proptest! {
        #[test]
        fn normalize_is_deterministic(raw in "\\PC{0,200}") {
            prop_assert_eq!(normalize(&raw), normalize(&raw));
        }

        #[test]
        fn clean_chars_never_emits_filtered_categories(raw in "\\PC{0,200}") {
            let cleaned = clean_chars(&raw);
            for c in cleaned.chars() {
                prop_assert!(c == ' ' || super::char_action(c) == super::CharAction::Keep);
            }
        }
    }
}
