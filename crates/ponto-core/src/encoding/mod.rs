//! Encoding normalizer for Portuguese text damaged by transcoding.
//!
//! Two pure operations sit on top of an immutable [`PatternTable`]:
//!
//! - detection ([`Normalizer::is_corrupted`]) looks for the fingerprints in
//!   [`detect`], independent of the table;
//! - repair ([`Normalizer::repair`]) applies the table by literal substring
//!   replacement, pass after pass, until a pass changes nothing. A few
//!   single-character patterns also check their neighbours before replacing.
//!
//! Every replacement in a table is strictly shorter than its pattern, so
//! each changing pass shortens the text and repair always reaches a
//! fixpoint. Repairing a repaired value is therefore a no-op.
//!
//! ```
//! use ponto_core::encoding::Normalizer;
//!
//! let normalizer = Normalizer::default();
//! assert!(normalizer.is_corrupted("Gon??alves"));
//! assert_eq!(normalizer.repair("Gon??alves"), "Gonçalves");
//! assert_eq!(normalizer.repair("normal text"), "normal text");
//! ```

pub mod detect;
pub mod patterns;

use std::borrow::Cow;
use std::sync::Arc;

use once_cell::sync::Lazy;

pub use detect::{is_corrupted_value, CorruptionSignature};
pub use patterns::{mis_decodings, CorruptionPattern, PatternTable, PatternTableBuilder, Tier};

static PORTUGUESE: Lazy<Arc<PatternTable>> = Lazy::new(|| Arc::new(PatternTable::portuguese()));

/// Detector and repairer sharing one pattern table.
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: Arc<PatternTable>,
}

impl Default for Normalizer {
    /// Normalizer over the process-wide Portuguese table.
    fn default() -> Self {
        Self {
            table: Arc::clone(&PORTUGUESE),
        }
    }
}

impl Normalizer {
    pub fn new(table: Arc<PatternTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    pub fn is_corrupted(&self, text: &str) -> bool {
        detect::is_corrupted(text)
    }

    pub fn signatures(&self, text: &str) -> Vec<CorruptionSignature> {
        detect::signatures(text)
    }

    /// Repair `text`, borrowing it when nothing matches.
    pub fn repair<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        loop {
            match self.repair_pass(&current) {
                Some(next) => current = Cow::Owned(next),
                None => return current,
            }
        }
    }

    /// Repair a field only when it is flagged and the repair changes it.
    ///
    /// Returns the new value, or `None` when the field should be left alone.
    pub fn normalize_field(&self, value: Option<&str>) -> Option<String> {
        let text = value.filter(|text| self.is_corrupted(text))?;
        match self.repair(text) {
            Cow::Owned(fixed) if fixed != text => Some(fixed),
            _ => None,
        }
    }

    /// One ordered pass over the table. `None` when nothing matched.
    fn repair_pass(&self, text: &str) -> Option<String> {
        let mut out: Option<String> = None;
        for pattern in self.table.patterns() {
            let current = out.as_deref().unwrap_or(text);
            if let Some(next) = pattern.apply(current) {
                out = Some(next);
            }
        }
        out
    }
}

/// Repair a single value with the default table. Pure, no I/O.
pub fn fix_one_field(text: &str) -> String {
    Normalizer::default().repair(text).into_owned()
}
