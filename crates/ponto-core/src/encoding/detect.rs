//! Corruption signatures.
//!
//! Detection is conservative: text is flagged only when it carries a
//! fingerprint that a known transcoding mistake leaves behind. Accented
//! characters on their own never flag text.

use serde::{Deserialize, Serialize};

use super::patterns::{is_ambiguous_continuation, reads_as_continuation, CP1252_HIGH};

/// Fingerprint of a specific transcoding mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionSignature {
    /// Two or more `?` against a letter: each byte of a multi-byte
    /// character was replaced by `?`.
    QuestionRun,
    /// `Ã` or `Â` followed by the rendering of a UTF-8 continuation byte.
    DoubleEncoded,
    /// `â€`, the rendering of the `E2 80` lead shared by curly quotes,
    /// dashes, bullets and the ellipsis.
    SmartQuote,
}

/// Every signature present in `text`, in declaration order.
pub fn signatures(text: &str) -> Vec<CorruptionSignature> {
    let mut found = Vec::new();
    if has_question_run(text) {
        found.push(CorruptionSignature::QuestionRun);
    }
    if has_double_encoding(text) {
        found.push(CorruptionSignature::DoubleEncoded);
    }
    if has_smart_quote_artifact(text) {
        found.push(CorruptionSignature::SmartQuote);
    }
    found
}

/// True when any signature matches.
pub fn is_corrupted(text: &str) -> bool {
    has_question_run(text) || has_double_encoding(text) || has_smart_quote_artifact(text)
}

/// Absent values are never corrupted.
pub fn is_corrupted_value(value: Option<&str>) -> bool {
    value.is_some_and(is_corrupted)
}

fn has_question_run(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '?' {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i] == '?' {
            i += 1;
        }
        if i - start < 2 {
            continue;
        }
        let before = start.checked_sub(1).map(|j| chars[j]);
        let after = chars.get(i).copied();
        if before.is_some_and(char::is_alphabetic) || after.is_some_and(char::is_alphabetic) {
            return true;
        }
    }
    false
}

fn is_continuation_rendering(c: char) -> bool {
    ('\u{0080}'..='\u{00BF}').contains(&c) || CP1252_HIGH.contains(&c)
}

/// `Ã`/`Â` followed by a continuation-byte rendering. Renderings that are
/// also ordinary punctuation only count when the surrounding letters say
/// so, otherwise `“MAÇÃ”` would read as a mis-decoded `Ô`.
fn has_double_encoding(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().any(|(i, &c)| {
        if c != 'Ã' && c != 'Â' {
            return false;
        }
        match chars.get(i + 1) {
            Some(&next) if is_ambiguous_continuation(next) => reads_as_continuation(
                i.checked_sub(1).map(|j| chars[j]),
                chars.get(i + 2).copied(),
            ),
            Some(&next) => is_continuation_rendering(next),
            None => false,
        }
    })
}

fn has_smart_quote_artifact(text: &str) -> bool {
    text.contains("â€") || text.contains("â\u{80}")
}
