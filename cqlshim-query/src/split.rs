//! Splitting multi-statement CQL text.
//!
//! Callers may hand a single string holding many `;`-terminated statements.
//! Each piece becomes an independent [`Statement`](crate::Statement) so the
//! executor can run them concurrently. Separators inside string literals,
//! quoted identifiers, `$$` literals and comments are not split points.

use crate::statement::Batch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    SingleQuoted,
    DoubleQuoted,
    Dollar,
    LineComment,
    BlockComment,
}

/// Walk `text`, calling `on_code` for every character outside literals and
/// comments with its byte offset. The opening quote of a literal or quoted
/// identifier (and the first `$` of `$$`) is reported as code.
fn scan(text: &str, mut on_code: impl FnMut(usize, char)) {
    let mut state = Lex::Code;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match state {
            Lex::Code => match (c, next) {
                ('\'', _) => {
                    on_code(i, c);
                    state = Lex::SingleQuoted;
                }
                ('"', _) => {
                    on_code(i, c);
                    state = Lex::DoubleQuoted;
                }
                ('$', Some('$')) => {
                    on_code(i, c);
                    chars.next();
                    state = Lex::Dollar;
                }
                ('-', Some('-')) | ('/', Some('/')) => {
                    chars.next();
                    state = Lex::LineComment;
                }
                ('/', Some('*')) => {
                    chars.next();
                    state = Lex::BlockComment;
                }
                _ => on_code(i, c),
            },
            // A doubled quote is an escaped quote; consume both.
            Lex::SingleQuoted if c == '\'' => {
                if next == Some('\'') {
                    chars.next();
                } else {
                    state = Lex::Code;
                }
            }
            Lex::DoubleQuoted if c == '"' => {
                if next == Some('"') {
                    chars.next();
                } else {
                    state = Lex::Code;
                }
            }
            Lex::Dollar if c == '$' && next == Some('$') => {
                chars.next();
                state = Lex::Code;
            }
            Lex::LineComment if c == '\n' => state = Lex::Code,
            Lex::BlockComment if c == '*' && next == Some('/') => {
                chars.next();
                state = Lex::Code;
            }
            _ => {}
        }
    }
}

/// Split CQL text on top-level `;`. Blank pieces are dropped and each piece
/// is trimmed; the separator itself is not kept.
#[must_use]
pub fn split_statements(text: &str) -> Vec<String> {
    let mut cuts = Vec::new();
    scan(text, |i, c| {
        if c == ';' {
            cuts.push(i);
        }
    });

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(text.len())) {
        let piece = text[start..cut].trim();
        if !is_blank(piece) {
            pieces.push(piece.to_string());
        }
        start = (cut + 1).min(text.len());
    }
    pieces
}

/// Split CQL text into a batch of literal statements.
#[must_use]
pub fn split_batch(text: &str) -> Batch {
    split_statements(text).into_iter().collect()
}

/// Keywords that may be followed directly by a named bind marker.
const MARKER_KEYWORDS: &[&str] = &["IN", "LIMIT", "TTL", "TIMESTAMP", "CONTAINS", "KEY"];

/// Count bind markers outside literals and comments.
///
/// Both positional `?` and named `:name` markers count; each occurrence is
/// one positional slot, in textual order. A `:` only starts a named marker
/// where a value is expected (after `(`, `,`, `=`, a comparison, `[`, `{` or
/// a keyword such as `LIMIT`), so map literals like `{1:true}` are not
/// mistaken for markers.
#[must_use]
pub fn count_placeholders(text: &str) -> usize {
    let mut count = 0;
    let mut prev: Option<char> = None;
    let mut word = String::new();
    let mut last_word = String::new();

    scan(text, |i, c| {
        if c == '?' {
            count += 1;
        } else if c == ':' {
            let starts_name = text[i + 1..]
                .chars()
                .next()
                .is_some_and(|n| n.is_ascii_alphabetic() || n == '_');
            let expects_value = match prev {
                Some('(' | ',' | '=' | '<' | '>' | '[' | '{') => true,
                Some(p) if p.is_ascii_alphanumeric() || p == '_' => MARKER_KEYWORDS
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(&last_word)),
                _ => false,
            };
            if starts_name && expects_value {
                count += 1;
            }
        }

        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            last_word.clone_from(&word);
        } else {
            word.clear();
        }
        if !c.is_whitespace() {
            prev = Some(c);
        }
    });
    count
}

/// A piece holding only whitespace and comments is blank.
fn is_blank(piece: &str) -> bool {
    let mut has_code = false;
    scan(piece, |_, c| has_code |= !c.is_whitespace());
    !has_code
}
