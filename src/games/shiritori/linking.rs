//! Linking rules: how a word's leading and trailing units are read.
//!
//! A linking unit is what the next word has to start with. Under the
//! character rule it is a single character; under the phonetic rule it is
//! a sound (a kana mora, or a romaji syllable for Latin words).

use super::script::LONG_VOWEL_MARK;
use serde::{Deserialize, Serialize};

/// Normalization used to compare words and read their linking units.
pub trait LinkingRule {
    /// Key under which a word is stored in the ledger.
    fn normalize(&self, word: &str) -> String;

    /// Unit the word starts with.
    fn leading_unit(&self, word: &str) -> Option<String>;

    /// Unit the next word must start with.
    fn trailing_unit(&self, word: &str) -> Option<String>;
}

/// Configured linking rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkingMode {
    /// Raw characters, case-folded. A trailing long-vowel mark is skipped.
    #[default]
    Character,
    /// Sounds: kana folded to hiragana with glide digraphs, romaji syllables.
    Phonetic,
}

impl LinkingRule for LinkingMode {
    fn normalize(&self, word: &str) -> String {
        let lowered = word.trim().to_lowercase();
        match self {
            LinkingMode::Character => lowered,
            LinkingMode::Phonetic => lowered.chars().map(fold_katakana).collect(),
        }
    }

    fn leading_unit(&self, word: &str) -> Option<String> {
        let word = self.normalize(word);
        match self {
            LinkingMode::Character => word.chars().next().map(String::from),
            LinkingMode::Phonetic if is_romaji(&word) => romaji_leading(&word),
            LinkingMode::Phonetic => kana_leading(&word),
        }
    }

    fn trailing_unit(&self, word: &str) -> Option<String> {
        let word = self.normalize(word);
        match self {
            LinkingMode::Character => word
                .chars()
                .rev()
                .find(|c| *c != LONG_VOWEL_MARK)
                .map(String::from),
            LinkingMode::Phonetic if is_romaji(&word) => romaji_trailing(&word),
            LinkingMode::Phonetic => kana_trailing(&word),
        }
    }
}

/// Small kana that glide onto the preceding mora.
const SMALL_GLIDES: [char; 9] = ['ゃ', 'ゅ', 'ょ', 'ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ', 'ゎ'];

/// Maps katakana onto the matching hiragana; other characters pass through.
pub fn fold_katakana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' | 'ヽ' | 'ヾ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Maps a small kana onto its full-size form.
fn enlarge(c: char) -> char {
    match c {
        'ぁ' => 'あ',
        'ぃ' => 'い',
        'ぅ' => 'う',
        'ぇ' => 'え',
        'ぉ' => 'お',
        'っ' => 'つ',
        'ゃ' => 'や',
        'ゅ' => 'ゆ',
        'ょ' => 'よ',
        'ゎ' => 'わ',
        _ => c,
    }
}

fn kana_leading(word: &str) -> Option<String> {
    let mut chars = word.chars();
    let first = chars.next()?;
    if SMALL_GLIDES.contains(&first) || first == 'っ' {
        return Some(enlarge(first).to_string());
    }
    let mut unit = first.to_string();
    if let Some(next) = chars.next()
        && SMALL_GLIDES.contains(&next)
    {
        unit.push(next);
    }
    Some(unit)
}

fn kana_trailing(word: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().filter(|c| *c != LONG_VOWEL_MARK).collect();
    let last = *chars.last()?;
    if last == 'っ' {
        return Some('つ'.to_string());
    }
    if SMALL_GLIDES.contains(&last) {
        return match chars.len().checked_sub(2).map(|i| chars[i]) {
            Some(prev) if !SMALL_GLIDES.contains(&prev) => Some(format!("{prev}{last}")),
            _ => Some(enlarge(last).to_string()),
        };
    }
    Some(last.to_string())
}

fn is_romaji(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase())
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'i' | b'u' | b'e' | b'o')
}

fn romaji_leading(word: &str) -> Option<String> {
    let bytes = word.as_bytes();
    let first = *bytes.first()?;
    if is_vowel(first) {
        return Some((first as char).to_string());
    }
    let end = bytes
        .iter()
        .take(4)
        .position(|b| is_vowel(*b))
        .unwrap_or(0);
    Some(word[..=end].to_string())
}

fn romaji_trailing(word: &str) -> Option<String> {
    let bytes = word.as_bytes();
    let v = bytes.len().checked_sub(1)?;
    let last = bytes[v];
    if !is_vowel(last) {
        // A final consonant is its own unit; a final `n` is the syllabic nasal.
        return Some((last as char).to_string());
    }

    let mut start = v;
    if v >= 1 && !is_vowel(bytes[v - 1]) {
        start = v - 1;
        if v >= 2 {
            let (p, q) = (bytes[v - 2], bytes[v - 1]);
            let digraph = (q == b'y' && !is_vowel(p))
                || (q == b'h' && matches!(p, b's' | b'c'))
                || (q == b's' && p == b't');
            if digraph {
                start = v - 2;
            }
        }
    }
    Some(word[start..].to_string())
}
