//! Ordered table of corrupted fragments and their replacements.
//!
//! A [`PatternTable`] is immutable once built. Entries are ordered by tier
//! (word, then sequence, then single character) and by corrupted-fragment
//! length inside a tier, longest first, so a short pattern can never
//! pre-empt a longer one that shares a prefix.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::logging::{components, subsystems};

/// Priority tier of a pattern. Lower tiers are applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Whole words and proper names (`Jo??o` → `João`).
    Word,
    /// Multi-character sequences such as grammatical suffixes (`????o` → `ção`).
    Sequence,
    /// A single corrupted diacritic or punctuation mark (`Ã§` → `ç`).
    Char,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Word => write!(f, "word"),
            Tier::Sequence => write!(f, "sequence"),
            Tier::Char => write!(f, "char"),
        }
    }
}

/// A corrupted fragment and the text it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionPattern {
    pub corrupted: String,
    pub replacement: String,
    pub tier: Tier,
    /// Replace only occurrences whose neighbours mark them as a
    /// mis-decoded letter rather than real punctuation.
    #[serde(default)]
    pub contextual: bool,
}

impl CorruptionPattern {
    fn corrupted_len(&self) -> usize {
        self.corrupted.chars().count()
    }

    /// Apply this pattern to `text`. `None` when nothing was replaced.
    pub fn apply(&self, text: &str) -> Option<String> {
        let needle = self.corrupted.as_str();
        if !text.contains(needle) {
            return None;
        }
        if !self.contextual {
            return Some(text.replace(needle, &self.replacement));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (start, _) in text.match_indices(needle) {
            let end = start + needle.len();
            let before = text[..start].chars().next_back();
            let after = text[end..].chars().next();
            if reads_as_continuation(before, after) {
                out.push_str(&text[last..start]);
                out.push_str(&self.replacement);
                last = end;
            }
        }
        if last == 0 {
            return None;
        }
        out.push_str(&text[last..]);
        Some(out)
    }
}

/// Immutable, priority-ordered list of corruption patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: Vec<CorruptionPattern>,
}

impl PatternTable {
    pub fn builder() -> PatternTableBuilder {
        PatternTableBuilder::default()
    }

    /// Patterns in application order.
    pub fn patterns(&self) -> &[CorruptionPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Table for Portuguese text damaged by lossy or double transcoding.
    pub fn portuguese() -> Self {
        portuguese_builder().build_lenient()
    }
}

/// Collects patterns and resolves ordering and collisions explicitly.
///
/// Rejected entries:
/// - an empty corrupted fragment,
/// - a replacement that is not strictly shorter than its fragment (the
///   repairer relies on every replacement shrinking the text),
/// - a fragment already mapped to a different replacement by a
///   higher-priority entry.
///
/// A fragment mapped twice to the same replacement keeps the
/// higher-priority entry.
#[derive(Debug, Default)]
pub struct PatternTableBuilder {
    entries: Vec<CorruptionPattern>,
}

impl PatternTableBuilder {
    pub fn pattern(
        mut self,
        tier: Tier,
        corrupted: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.entries.push(CorruptionPattern {
            corrupted: corrupted.into(),
            replacement: replacement.into(),
            tier,
            contextual: false,
        });
        self
    }

    pub fn word(self, corrupted: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.pattern(Tier::Word, corrupted, replacement)
    }

    pub fn sequence(self, corrupted: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.pattern(Tier::Sequence, corrupted, replacement)
    }

    pub fn character(self, corrupted: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.pattern(Tier::Char, corrupted, replacement)
    }

    /// Add every mis-decoding of `c` as a single-character pattern.
    ///
    /// Renderings whose second character is also ordinary punctuation
    /// (`Ã”` for `Ô`, `Ã–` for `Ö`) are contextual.
    pub fn mis_decodings_of(mut self, c: char) -> Self {
        for corrupted in mis_decodings(c) {
            let contextual = is_ambiguous_pair(&corrupted);
            self.entries.push(CorruptionPattern {
                corrupted,
                replacement: c.to_string(),
                tier: Tier::Char,
                contextual,
            });
        }
        self
    }

    /// Build the table, failing on the first rejected entry.
    pub fn build(self) -> Result<PatternTable> {
        let (table, rejected) = self.resolve();
        match rejected.into_iter().next() {
            Some(reason) => Err(Error::Config(reason)),
            None => Ok(table),
        }
    }

    /// Build the table, dropping rejected entries with a warning.
    pub fn build_lenient(self) -> PatternTable {
        let (table, rejected) = self.resolve();
        for reason in rejected {
            warn!(
                subsystem = subsystems::ENCODING,
                component = components::PATTERNS,
                "{}",
                reason
            );
        }
        table
    }

    fn resolve(self) -> (PatternTable, Vec<String>) {
        let mut entries = self.entries;
        // Stable: equal keys keep insertion order.
        entries.sort_by(|a, b| {
            a.tier
                .cmp(&b.tier)
                .then_with(|| b.corrupted_len().cmp(&a.corrupted_len()))
        });

        let mut seen: HashMap<String, String> = HashMap::new();
        let mut patterns = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();

        for entry in entries {
            if entry.corrupted.is_empty() {
                rejected.push(format!(
                    "empty {} pattern for replacement '{}'",
                    entry.tier, entry.replacement
                ));
                continue;
            }
            if entry.replacement.chars().count() >= entry.corrupted_len() {
                rejected.push(format!(
                    "{} pattern '{}' does not shrink: replacement '{}'",
                    entry.tier, entry.corrupted, entry.replacement
                ));
                continue;
            }
            match seen.get(&entry.corrupted) {
                Some(existing) if *existing == entry.replacement => continue,
                Some(existing) => {
                    rejected.push(format!(
                        "conflicting pattern '{}': '{}' already maps to '{}'",
                        entry.corrupted, entry.replacement, existing
                    ));
                    continue;
                }
                None => {}
            }
            seen.insert(entry.corrupted.clone(), entry.replacement.clone());
            patterns.push(entry);
        }

        (PatternTable { patterns }, rejected)
    }
}

/// Windows-1252 renderings of bytes 0x80..=0x9F. The five undefined bytes
/// map to the C1 control of the same value.
pub(crate) const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Continuation bytes whose Windows-1252 rendering is punctuation that
/// also follows uppercase words ending in `Ã` (`IRMÃ”`, `CAPITÃ–mor`):
/// the ellipsis, the curly quotes, the bullet and the two dashes.
const AMBIGUOUS_BYTES: [u8; 8] = [0x85, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97];

/// True when `c` is the Windows-1252 rendering of one of [`AMBIGUOUS_BYTES`].
pub(crate) fn is_ambiguous_continuation(c: char) -> bool {
    AMBIGUOUS_BYTES.iter().any(|&b| cp1252_char(b) == c)
}

/// Whether an `Ã`/`Â` plus ambiguous punctuation pair is a mis-decoded
/// character, given the characters around the pair.
///
/// A letter must follow. After a letter, that letter must also be
/// uppercase, as inside a mis-decoded uppercase word (`LIÃ‡Ã•ES`); a
/// lowercase letter there means real punctuation (`IRMÃ’s`). At a word
/// start any letter will do (`Ã“timo`).
pub(crate) fn reads_as_continuation(before: Option<char>, after: Option<char>) -> bool {
    after.is_some_and(|a| {
        a.is_alphabetic() && (a.is_uppercase() || !before.is_some_and(char::is_alphabetic))
    })
}

fn is_ambiguous_pair(corrupted: &str) -> bool {
    let mut chars = corrupted.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some('Ã' | 'Â'), Some(c), None) if is_ambiguous_continuation(c)
    )
}

fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// How `c` reads after its UTF-8 bytes are decoded as Latin-1 and as
/// Windows-1252. Empty for ASCII, which survives both.
pub fn mis_decodings(c: char) -> Vec<String> {
    if c.is_ascii() {
        return Vec::new();
    }
    let mut buf = [0u8; 4];
    let bytes = c.encode_utf8(&mut buf).as_bytes();

    let latin1: String = bytes.iter().map(|&b| char::from(b)).collect();
    let cp1252: String = bytes.iter().map(|&b| cp1252_char(b)).collect();

    if latin1 == cp1252 {
        vec![latin1]
    } else {
        vec![cp1252, latin1]
    }
}

/// Typographic punctuation whose UTF-8 form starts with `E2 80`.
const PUNCTUATION: &[char] = &[
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2013}', '\u{2014}', '\u{2026}', '\u{2022}',
];

const WORDS: &[(&str, &str)] = &[
    ("Gon??alves", "Gonçalves"),
    ("Jo??o", "João"),
    ("Mar??a", "Maria"),
    ("Ant??nio", "António"),
    ("Jos??", "José"),
    ("Lu??s", "Luís"),
    ("Andr??", "André"),
    ("In??s", "Inês"),
    ("Concei????o", "Conceição"),
    ("Sebasti??o", "Sebastião"),
    ("cria????o", "criação"),
    ("informa????es", "informações"),
    ("solu????o", "solução"),
    ("configura????o", "configuração"),
    ("configura????es", "configurações"),
    ("administra????o", "administração"),
    ("situa????o", "situação"),
    ("avan??ado", "avançado"),
    ("fun????o", "função"),
    ("gest??o", "gestão"),
    ("rela????o", "relação"),
    ("vers??o", "versão"),
    ("edi????o", "edição"),
    ("produ????o", "produção"),
    ("instala????o", "instalação"),
    ("opera????o", "operação"),
    ("execu????o", "execução"),
];

const SEQUENCES: &[(&str, &str)] = &[
    ("Ã§Ã£o", "ção"),
    ("Ã§Ãµes", "ções"),
    ("Ãªncia", "ência"),
    ("Ã¡rio", "ário"),
    ("Ã¡ria", "ária"),
    ("????es", "ções"),
    ("????o", "ção"),
    ("??o", "ão"),
];

fn portuguese_builder() -> PatternTableBuilder {
    let mut builder = PatternTable::builder();
    for (corrupted, replacement) in WORDS {
        builder = builder.word(*corrupted, *replacement);
    }
    for (corrupted, replacement) in SEQUENCES {
        builder = builder.sequence(*corrupted, *replacement);
    }
    // Latin-1 supplement: every accented letter plus º, ª, °, NBSP and friends.
    for c in '\u{00A0}'..='\u{00FF}' {
        builder = builder.mis_decodings_of(c);
    }
    for &c in PUNCTUATION {
        builder = builder.mis_decodings_of(c);
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mis_decodings_of_cedilla() {
        assert_eq!(mis_decodings('ç'), vec!["Ã§".to_string()]);
    }

    #[test]
    fn test_mis_decodings_differ_between_charsets() {
        // 'Ç' is C3 87: 0x87 is '‡' in Windows-1252 and a C1 control in Latin-1.
        assert_eq!(
            mis_decodings('Ç'),
            vec!["Ã‡".to_string(), "Ã\u{87}".to_string()]
        );
    }

    #[test]
    fn test_mis_decodings_of_right_quote() {
        let renderings = mis_decodings('\u{2019}');
        assert_eq!(renderings[0], "â€™");
        assert_eq!(renderings.len(), 2);
    }

    #[test]
    fn test_punctuation_renderings_are_contextual() {
        let table = PatternTable::portuguese();
        let find = |s: &str| table.patterns().iter().find(|p| p.corrupted == s).unwrap();
        assert!(find("Ã\u{201D}").contextual);
        assert!(find("Ã\u{2013}").contextual);
        assert!(find("Ã\u{2026}").contextual);
        assert!(!find("Ã§").contextual);
        assert!(!find("Ã\u{2021}").contextual);
        // The Latin-1 rendering is a C1 control and never legitimate.
        assert!(!find("Ã\u{94}").contextual);
    }

    #[test]
    fn test_contextual_pattern_needs_letter_context() {
        let table = PatternTable::portuguese();
        let pattern = table
            .patterns()
            .iter()
            .find(|p| p.corrupted == "Ã\u{201C}")
            .unwrap();
        assert_eq!(pattern.apply("Ã\u{201C}timo").as_deref(), Some("Ótimo"));
        assert_eq!(pattern.apply("O Ã\u{201C}RGÃO").as_deref(), Some("O ÓRGÃO"));
        assert_eq!(pattern.apply("IRMÃ\u{201C}s"), None);
        assert_eq!(pattern.apply("MAÇÃ\u{201C}"), None);
        assert_eq!(pattern.apply("MAÇÃ\u{201C} e"), None);
    }

    #[test]
    fn test_mis_decodings_ascii_is_empty() {
        assert!(mis_decodings('a').is_empty());
    }

    #[test]
    fn test_portuguese_table_builds_strictly() {
        let table = portuguese_builder().build().expect("default table must be valid");
        assert!(table.len() > WORDS.len() + SEQUENCES.len());
    }

    #[test]
    fn test_order_is_tier_then_length() {
        let table = PatternTable::portuguese();
        let patterns = table.patterns();
        for pair in patterns.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.tier <= b.tier, "{:?} before {:?}", a, b);
            if a.tier == b.tier {
                assert!(a.corrupted_len() >= b.corrupted_len());
            }
        }
        assert_eq!(patterns.first().map(|p| p.tier), Some(Tier::Word));
        assert_eq!(patterns.last().map(|p| p.tier), Some(Tier::Char));
    }

    #[test]
    fn test_longer_sequence_precedes_its_suffix() {
        let table = PatternTable::portuguese();
        let position = |s: &str| {
            table
                .patterns()
                .iter()
                .position(|p| p.corrupted == s)
                .unwrap()
        };
        assert!(position("????o") < position("??o"));
    }

    #[test]
    fn test_every_replacement_shrinks() {
        for p in PatternTable::portuguese().patterns() {
            assert!(p.replacement.chars().count() < p.corrupted.chars().count());
        }
    }

    #[test]
    fn test_builder_rejects_conflicting_duplicate() {
        let result = PatternTable::builder()
            .word("Mar??a", "Maria")
            .word("Mar??a", "Marta")
            .build();
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("conflicting")),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_collapses_identical_duplicate_across_tiers() {
        let table = PatternTable::builder()
            .character("Ã§", "ç")
            .word("Ã§", "ç")
            .build()
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.patterns()[0].tier, Tier::Word);
    }

    #[test]
    fn test_builder_rejects_growing_replacement() {
        let result = PatternTable::builder().character("?", "ão").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_rejects_empty_fragment() {
        let result = PatternTable::builder().character("", "").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_lenient_build_keeps_valid_entries() {
        let table = PatternTable::builder()
            .word("Jo??o", "João")
            .word("Jo??o", "Joana")
            .character("x", "xyz")
            .build_lenient();
        assert_eq!(table.len(), 1);
        assert_eq!(table.patterns()[0].replacement, "João");
    }
}
