//! Game-level error taxonomy.
//!
//! Every variant is recoverable at the session level: the adapter renders
//! it for the user and the process carries on.

use crate::games::shiritori::PlayerId;
use serde::{Deserialize, Serialize};

/// Why a word failed the format rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum FormatProblem {
    /// Nothing left after trimming.
    #[display("Word is empty")]
    Empty,

    /// A character outside the accepted scripts.
    #[display("Character '{}' is not allowed", character)]
    ForeignCharacter {
        /// The offending character.
        character: char,
    },

    /// Fewer characters than the configured minimum.
    #[display("Word must be at least {} characters", min)]
    TooShort {
        /// Configured minimum.
        min: usize,
    },

    /// More characters than the configured maximum.
    #[display("Word must be at most {} characters", max)]
    TooLong {
        /// Configured maximum.
        max: usize,
    },

    /// The word has no linking unit (e.g. only long-vowel marks).
    #[display("Word has no usable sound to link from")]
    NoLinkingUnit,
}

/// Error returned by the engine handlers.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GameError {
    /// The word is malformed.
    #[display("Invalid word: {}", _0)]
    InvalidFormat(FormatProblem),

    /// The word does not start with the previous word's trailing unit.
    #[display("Word must start with '{}' but starts with '{}'", expected, found)]
    ChainBroken {
        /// Trailing unit of the previous word.
        expected: String,
        /// Leading unit of the candidate.
        found: String,
    },

    /// The word was already played in this session.
    #[display("'{}' has already been used", _0)]
    AlreadyUsed(String),

    /// Someone else holds the turn.
    #[display("It is {}'s turn", current)]
    NotYourTurn {
        /// Player holding the turn.
        current: PlayerId,
    },

    /// Recruitment is over.
    #[display("The roster is closed")]
    RosterClosed,

    /// Not enough players to begin.
    #[display("{} player(s) joined, at least {} required", joined, required)]
    TooFewPlayers {
        /// Players currently recruited.
        joined: usize,
        /// Configured minimum.
        required: usize,
    },

    /// The player is already on the roster.
    #[display("Player has already joined")]
    AlreadyJoined,

    /// The judgment service could not be reached in time.
    #[display("Word judgment unavailable after {} attempt(s)", attempts)]
    GatewayUnavailable {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The judgment service rejected the word.
    #[display("Word rejected: {}", reason)]
    GatewayRejected {
        /// Explanation from the service.
        reason: String,
    },

    /// The seed word ends in a losing unit.
    #[display("'{}' ends in a losing sound and cannot open the game", _0)]
    TerminalSeed(String),

    /// Only the host may do this.
    #[display("Only the host can do that")]
    NotHost,

    /// The session is not in active play.
    #[display("The game is not in progress")]
    NotInProgress,

    /// No live session in the channel.
    #[display("No game in this channel")]
    NoActiveGame,

    /// The session ended while the request was being processed.
    #[display("The game ended before the request completed")]
    SessionEnded,

    /// The session hit an internal consistency fault and was aborted.
    #[display("The game was aborted after an internal error")]
    SessionAborted,
}

impl std::error::Error for GameError {}

impl GameError {
    /// Stable snake_case name of the variant, for adapters.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

impl From<FormatProblem> for GameError {
    fn from(problem: FormatProblem) -> Self {
        GameError::InvalidFormat(problem)
    }
}
