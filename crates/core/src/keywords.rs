//! Keyword Helpers
//!
//! Small tokenisation helpers shared by memory selection and the moderator
//! intervention detector. Everything is lowercase and ASCII-agnostic: tokens are
//! runs of alphanumeric characters (plus `'` inside words such as "don't").
//!
//! [`stem`] folds common English inflections ("loved", "loving", "loves")
//! onto one form so word matching survives tense and plurals.

use std::collections::HashSet;

/// Minimum length (exclusive) for a token to count as a content word.
pub const CONTENT_WORD_MIN_LEN: usize = 3;

/// Split text into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|s| s.trim_matches('\''))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Extract keywords (tokens of at least 3 characters), de-duplicated in first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= 3)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Content words: distinct tokens longer than [`CONTENT_WORD_MIN_LEN`] characters.
pub fn content_words(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > CONTENT_WORD_MIN_LEN)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Words this short are never stemmed, and no suffix strip leaves fewer letters.
pub const STEM_MIN_LEN: usize = 3;

/// Stems at least this long also match longer words they start ("forever" in
/// "forevermore").
pub const PREFIX_MIN_LEN: usize = 5;

/// Reduce a word to its stem.
///
/// A light Porter-style stemmer: strips "-ly", plural "-s"/"-ies", "-ed" and
/// "-ing" (restoring a dropped "e" or undoubling a consonant), then folds a
/// final "y" to "i" and drops a silent final "e". Words with anything but
/// ASCII letters are returned lowercased and otherwise unchanged.
pub fn stem(word: &str) -> String {
    let mut w = word.to_lowercase();
    if w.len() <= STEM_MIN_LEN || !w.bytes().all(|b| b.is_ascii_lowercase()) {
        return w;
    }

    if w.ends_with("ly") && w.len() - 2 > STEM_MIN_LEN {
        w.truncate(w.len() - 2);
    }
    strip_plural(&mut w);
    strip_past_and_progressive(&mut w);

    if w.ends_with('y') && has_vowel(&w.as_bytes()[..w.len() - 1]) {
        w.pop();
        w.push('i');
    }

    if w.ends_with('e') {
        let base = &w.as_bytes()[..w.len() - 1];
        let m = measure(base);
        if m > 1 || (m == 1 && !ends_cvc(base)) {
            w.pop();
        }
    }
    w
}

/// True when `token_stem` is `word_stem`, or extends a long enough `word_stem`.
pub fn stem_matches(token_stem: &str, word_stem: &str) -> bool {
    token_stem == word_stem
        || (word_stem.len() >= PREFIX_MIN_LEN && token_stem.starts_with(word_stem))
}

/// Distinct stems of the content words in `text`, in first-seen order.
pub fn content_stems(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content_words(text)
        .iter()
        .map(|w| stem(w))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Stems of every token in `text`, for repeated membership checks.
pub fn stem_set(text: &str) -> HashSet<String> {
    tokenize(text).iter().map(|t| stem(t)).collect()
}

fn strip_plural(w: &mut String) {
    if w.ends_with("sses") || w.ends_with("ies") {
        if w.len() - 2 >= STEM_MIN_LEN {
            w.truncate(w.len() - 2);
        }
    } else if w.ends_with('s') && !w.ends_with("ss") && w.len() - 1 >= STEM_MIN_LEN {
        w.pop();
    }
}

fn strip_past_and_progressive(w: &mut String) {
    if w.ends_with("eed") {
        if measure(&w.as_bytes()[..w.len() - 3]) > 0 {
            w.pop();
        }
        return;
    }

    let suffix_len = if w.ends_with("ed") {
        2
    } else if w.ends_with("ing") {
        3
    } else {
        return;
    };
    let base_len = w.len() - suffix_len;
    if base_len < 2 || !has_vowel(&w.as_bytes()[..base_len]) {
        return;
    }
    w.truncate(base_len);

    let b = w.as_bytes();
    if w.ends_with("at") || w.ends_with("bl") || w.ends_with("iz") {
        w.push('e');
    } else if ends_double_consonant(b) && !matches!(b[b.len() - 1], b'l' | b's' | b'z') {
        w.pop();
    } else if measure(b) == 1 && ends_cvc(b) {
        w.push('e');
    }
}

fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

/// Number of vowel-to-consonant transitions.
fn measure(w: &[u8]) -> usize {
    let mut m = 0;
    let mut prev_vowel = false;
    for i in 0..w.len() {
        let consonant = is_consonant(w, i);
        if consonant && prev_vowel {
            m += 1;
        }
        prev_vowel = !consonant;
    }
    m
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// Consonant-vowel-consonant ending whose last letter is not w, x or y.
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

/// Case-insensitive phrase match on word boundaries.
///
/// `"not sure"` matches "I'm not sure." but `"love"` does not match "glove".
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let needle = tokenize(phrase);
    if needle.is_empty() {
        return false;
    }
    let haystack = tokenize(text);
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_slice())
}
