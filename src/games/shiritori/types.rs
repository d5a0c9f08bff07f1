//! Core domain types for shiritori.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Unique identifier for a chat channel (one live game per channel).
pub type ChannelId = String;

/// Platform-assigned identity of a player.
pub type PlayerId = String;

/// A player in a game session.
///
/// Players are referenced by identity; the display label is only carried
/// along for adapters rendering the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct Player {
    /// Platform identity.
    id: PlayerId,
    /// Display label.
    display_name: String,
}

impl Player {
    /// Creates a new player.
    #[instrument(skip_all)]
    pub fn new(id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// How words are judged against the previous word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Classic shiritori: words link by their linking units.
    #[default]
    Chain,
    /// Association shiritori: words must be semantically associated.
    Association,
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Players are joining.
    Recruiting,
    /// Words are being played.
    Active,
    /// Terminal phase.
    Ended,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    /// Every other player was eliminated.
    Won {
        /// The last player standing.
        winner: Player,
    },
    /// Recruitment was called off before play started.
    Cancelled,
    /// Play was stopped by an explicit end request.
    Forced,
    /// No valid submission arrived within the idle timeout.
    IdleTimeout,
    /// An internal consistency fault aborted the session.
    Aborted,
}

impl EndReason {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<&Player> {
        match self {
            EndReason::Won { winner } => Some(winner),
            _ => None,
        }
    }
}

/// A word accepted into play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct WordEntry {
    /// The word as submitted (trimmed).
    text: String,
    /// Ledger key under the configured normalization.
    normalized: String,
    /// Trailing linking unit the next word must start with.
    trailing_unit: String,
    /// Submitting player, `None` for the seed word.
    submitted_by: Option<PlayerId>,
    /// When the word was accepted.
    accepted_at: DateTime<Utc>,
}

impl WordEntry {
    /// Creates a new word entry stamped with the current time.
    #[instrument(skip_all, fields(text = %text))]
    pub fn new(
        text: String,
        normalized: String,
        trailing_unit: String,
        submitted_by: Option<PlayerId>,
    ) -> Self {
        Self {
            text,
            normalized,
            trailing_unit,
            submitted_by,
            accepted_at: Utc::now(),
        }
    }
}
