//! Word-chain validation.
//!
//! Pure and deterministic: the validator only reports whether a candidate
//! may follow the previous word and whether it ends in a losing unit.
//! Deciding what a losing word means for the game is the session's job.

use super::linking::{LinkingMode, LinkingRule};
use super::script::{Script, WordFormat};
use super::types::GameMode;
use crate::error::{FormatProblem, GameError};
use tracing::{debug, instrument};

/// A candidate that passed the chain rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAcceptance {
    /// The trimmed word.
    pub word: String,
    /// Ledger key of the word.
    pub normalized: String,
    /// Unit the next word must start with.
    pub trailing_unit: String,
    /// Whether the word ends in a losing unit.
    pub terminal: bool,
}

/// Validates candidates against the previous word.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    format: WordFormat,
    linking: LinkingMode,
    terminal_units: Vec<String>,
    mode: GameMode,
}

impl ChainValidator {
    /// Creates a validator. Terminal units are normalized with the linking rule.
    #[instrument(skip(terminal_units))]
    pub fn new(
        scripts: Vec<Script>,
        min_len: usize,
        max_len: usize,
        linking: LinkingMode,
        terminal_units: &[String],
        mode: GameMode,
    ) -> Self {
        let terminal_units = terminal_units
            .iter()
            .map(|unit| linking.normalize(unit))
            .filter(|unit| !unit.is_empty())
            .collect();
        Self {
            format: WordFormat::new(scripts, min_len, max_len),
            linking,
            terminal_units,
            mode,
        }
    }

    /// Returns the linking rule in use.
    pub fn linking(&self) -> LinkingMode {
        self.linking
    }

    /// Whether the unit is a losing unit.
    pub fn is_terminal_unit(&self, unit: &str) -> bool {
        self.terminal_units.iter().any(|t| t == unit)
    }

    /// Applies the format rule alone (used for seed words).
    #[instrument(skip(self))]
    pub fn check_standalone(&self, word: &str) -> Result<ChainAcceptance, GameError> {
        let word = self.format.check(word)?;
        let trailing_unit = self
            .linking
            .trailing_unit(word)
            .ok_or(FormatProblem::NoLinkingUnit)?;
        let terminal = self.mode == GameMode::Chain && self.is_terminal_unit(&trailing_unit);
        Ok(ChainAcceptance {
            word: word.to_string(),
            normalized: self.linking.normalize(word),
            trailing_unit,
            terminal,
        })
    }

    /// Validates `candidate` as the word following `previous`.
    ///
    /// Rules, in order: format, leading unit equals the previous trailing
    /// unit, terminal flag. Association play skips the last two.
    #[instrument(skip(self))]
    pub fn validate(&self, previous: &str, candidate: &str) -> Result<ChainAcceptance, GameError> {
        let accepted = self.check_standalone(candidate)?;
        if self.mode == GameMode::Association {
            return Ok(accepted);
        }

        let expected = self
            .linking
            .trailing_unit(previous)
            .ok_or(FormatProblem::NoLinkingUnit)?;
        let found = self
            .linking
            .leading_unit(&accepted.word)
            .ok_or(FormatProblem::NoLinkingUnit)?;

        if expected != found {
            debug!(%expected, %found, "Chain broken");
            return Err(GameError::ChainBroken { expected, found });
        }

        debug!(terminal = accepted.terminal, "Chain accepted");
        Ok(accepted)
    }
}
