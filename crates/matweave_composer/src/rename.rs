//! Identifier Renamer
//!
//! Rewrites whole-word identifier occurrences in fragment source text. A
//! match is whole-word when it is not directly preceded or followed by
//! another identifier character, so `Foo` never matches inside `FooBar` or
//! `Foo_1`. That boundary rule is also what makes renaming idempotent: a
//! suffixed name is a different word and is not matched again.
//!
//! Both entry points run as a single forward scan that copies untouched
//! spans into a fresh buffer.

use rustc_hash::FxHashSet;

/// Which whole-word occurrence(s) of a word to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameMode {
    All,
    First,
    Last,
    /// The match at this position in scan order (0-based).
    Nth(usize),
}

#[inline]
pub(crate) fn is_identifier_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Byte ranges of every maximal identifier-character run.
fn words(input: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let bytes = input.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() && !is_identifier_char(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        while pos < bytes.len() && is_identifier_char(bytes[pos]) {
            pos += 1;
        }
        Some((start, pos))
    })
}

/// Appends `suffix` to every whole-word occurrence of any of `names`.
#[must_use]
pub fn rename<'a>(body: &str, names: impl IntoIterator<Item = &'a str>, suffix: &str) -> String {
    let names: FxHashSet<&str> = names.into_iter().collect();
    if names.is_empty() {
        return body.to_owned();
    }

    let mut out = String::with_capacity(body.len() + suffix.len() * 4);
    let mut copied = 0;
    for (start, end) in words(body) {
        if names.contains(&body[start..end]) {
            out.push_str(&body[copied..end]);
            out.push_str(suffix);
            copied = end;
        }
    }
    out.push_str(&body[copied..]);
    out
}

/// Appends `suffix` to the selected whole-word occurrence(s) of `name`.
#[must_use]
pub fn rename_occurrence(body: &str, name: &str, suffix: &str, mode: RenameMode) -> String {
    replace_word(body, name, &format!("{name}{suffix}"), mode)
}

/// Replaces the selected whole-word occurrence(s) of `word` with `replacement`.
#[must_use]
pub fn replace_word(input: &str, word: &str, replacement: &str, mode: RenameMode) -> String {
    let matches: Vec<(usize, usize)> = words(input)
        .filter(|&(start, end)| &input[start..end] == word)
        .collect();

    let selected: &[(usize, usize)] = match mode {
        RenameMode::All => &matches,
        RenameMode::First => matches.first().map(std::slice::from_ref).unwrap_or_default(),
        RenameMode::Last => matches.last().map(std::slice::from_ref).unwrap_or_default(),
        RenameMode::Nth(n) => matches.get(n).map(std::slice::from_ref).unwrap_or_default(),
    };
    if selected.is_empty() {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len() + replacement.len() * selected.len());
    let mut copied = 0;
    for &(start, end) in selected {
        out.push_str(&input[copied..start]);
        out.push_str(replacement);
        copied = end;
    }
    out.push_str(&input[copied..]);
    out
}
