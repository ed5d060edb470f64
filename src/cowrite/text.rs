//! Plain-text extraction and word counting for document markup.
//!
//! Document content is whatever markup the editing surface produces (HTML in
//! practice). The store never looks inside it; these helpers exist for the
//! derived `word_count` and for search.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "li",
    "br",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "pre",
    "tr",
];

/// Count maximal runs of ASCII word characters (`[A-Za-z0-9_]`).
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Word count of a markup payload, as shown to the user and stored on save.
pub fn word_count(markup: &str) -> usize {
    count_words(&plain_text(markup))
}

/// Strip tags and decode entities. Block-level tags become line breaks so
/// that words in adjacent paragraphs do not run together.
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find(|c: char| c == '<' || c == '&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('<') {
            match rest.find('>') {
                Some(end) => {
                    if is_block_tag(&rest[1..end]) {
                        out.push('\n');
                    }
                    rest = &rest[end + 1..];
                }
                None => {
                    // Unterminated tag: drop the remainder
                    rest = "";
                }
            }
        } else {
            match decode_entity(rest) {
                Some((decoded, len)) => {
                    out.push(decoded);
                    rest = &rest[len..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_block_tag(inner: &str) -> bool {
    let name: String = inner
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

/// Decode an entity at the start of `s`. Returns the character and the
/// number of bytes consumed.
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.find(';')?;
    if end > 10 {
        return None;
    }
    let body = &s[1..end];
    let ch = match body {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" | "#39" => '\'',
        _ => {
            let num = body.strip_prefix('#')?;
            let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some((ch, end + 1))
}
