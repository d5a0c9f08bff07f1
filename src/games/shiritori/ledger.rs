//! Append-only record of the words played in a session.

use super::linking::{LinkingMode, LinkingRule};
use super::types::WordEntry;
use crate::error::GameError;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Words used so far, in play order.
#[derive(Debug, Clone)]
pub struct LexiconLedger {
    linking: LinkingMode,
    entries: Vec<WordEntry>,
    keys: HashSet<String>,
}

impl LexiconLedger {
    /// Creates an empty ledger comparing words under `linking`.
    #[instrument]
    pub fn new(linking: LinkingMode) -> Self {
        Self {
            linking,
            entries: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Appends a word, rejecting a normalized duplicate.
    #[instrument(skip(self, entry), fields(word = %entry.text()))]
    pub fn record(&mut self, entry: WordEntry) -> Result<(), GameError> {
        if !self.keys.insert(entry.normalized().clone()) {
            debug!("Word already in ledger");
            return Err(GameError::AlreadyUsed(entry.text().clone()));
        }
        self.entries.push(entry);
        debug!(len = self.entries.len(), "Word recorded");
        Ok(())
    }

    /// Checks whether the word has been used, ignoring case and kana form.
    pub fn contains(&self, word: &str) -> bool {
        self.keys.contains(&self.linking.normalize(word))
    }

    /// Returns the entries in play order.
    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    /// Returns the most recent entry.
    pub fn last(&self) -> Option<&WordEntry> {
        self.entries.last()
    }

    /// Number of words played, seed included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been played yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mode: LinkingMode, word: &str) -> WordEntry {
        WordEntry::new(
            word.to_string(),
            mode.normalize(word),
            mode.trailing_unit(word).unwrap_or_default(),
            None,
        )
    }

    #[test]
    fn test_record_rejects_duplicates_case_insensitively() {
        let mode = LinkingMode::Character;
        let mut ledger = LexiconLedger::new(mode);
        ledger.record(entry(mode, "Ringo")).expect("first record");
        let result = ledger.record(entry(mode, "ringo"));
        assert_eq!(result, Err(GameError::AlreadyUsed("ringo".to_string())));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_phonetic_ledger_treats_kana_forms_as_one_word() {
        let mode = LinkingMode::Phonetic;
        let mut ledger = LexiconLedger::new(mode);
        ledger.record(entry(mode, "ゴリラ")).expect("first record");
        assert!(ledger.contains("ごりら"));
        assert!(ledger.record(entry(mode, "ごりら")).is_err());
    }

    #[test]
    fn test_character_ledger_keeps_kana_forms_apart() {
        let mode = LinkingMode::Character;
        let mut ledger = LexiconLedger::new(mode);
        ledger.record(entry(mode, "ゴリラ")).expect("first record");
        assert!(!ledger.contains("ごりら"));
    }
}
