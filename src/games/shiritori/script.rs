//! Accepted writing systems and the word-format rule.

use crate::error::FormatProblem;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// The katakana-hiragana prolonged sound mark.
pub const LONG_VOWEL_MARK: char = 'ー';

/// A writing system words may be composed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Script {
    /// Hiragana (ぁ–ゖ plus iteration marks).
    Hiragana,
    /// Katakana (ァ–ヺ plus iteration marks).
    Katakana,
    /// ASCII letters, for romaji or plain alphabetic play.
    Latin,
}

impl Script {
    /// Checks whether the character belongs to this script.
    pub fn contains(self, c: char) -> bool {
        match self {
            Script::Hiragana => matches!(c, '\u{3041}'..='\u{3096}' | 'ゝ' | 'ゞ'),
            Script::Katakana => matches!(c, '\u{30A1}'..='\u{30FA}' | 'ヽ' | 'ヾ'),
            Script::Latin => c.is_ascii_alphabetic(),
        }
    }

    /// Whether this is a kana script.
    pub fn is_kana(self) -> bool {
        matches!(self, Script::Hiragana | Script::Katakana)
    }
}

/// Format constraints applied before any linking check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFormat {
    scripts: Vec<Script>,
    min_len: usize,
    max_len: usize,
}

impl WordFormat {
    /// Creates a new format rule.
    #[instrument]
    pub fn new(scripts: Vec<Script>, min_len: usize, max_len: usize) -> Self {
        Self {
            scripts,
            min_len,
            max_len,
        }
    }

    /// Checks whether a single character is acceptable.
    pub fn accepts_char(&self, c: char) -> bool {
        if c == LONG_VOWEL_MARK {
            return self.scripts.iter().any(|s| s.is_kana());
        }
        self.scripts.iter().any(|s| s.contains(c))
    }

    /// Trims the word and checks it against the format rule.
    ///
    /// Returns the trimmed word on success.
    #[instrument(skip(self))]
    pub fn check<'a>(&self, word: &'a str) -> Result<&'a str, FormatProblem> {
        let word = word.trim();
        if word.is_empty() {
            return Err(FormatProblem::Empty);
        }

        if let Some(character) = word.chars().find(|c| !self.accepts_char(*c)) {
            debug!(%character, "Foreign character in word");
            return Err(FormatProblem::ForeignCharacter { character });
        }

        let len = word.chars().count();
        if len < self.min_len {
            return Err(FormatProblem::TooShort { min: self.min_len });
        }
        if len > self.max_len {
            return Err(FormatProblem::TooLong { max: self.max_len });
        }

        if word.chars().all(|c| c == LONG_VOWEL_MARK) {
            return Err(FormatProblem::NoLinkingUnit);
        }

        Ok(word)
    }
}
