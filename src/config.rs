//! Engine configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no
//! file at all) yields a playable kana game.

use crate::games::shiritori::{GameMode, LinkingMode, Script};
use crate::llm_client::{LlmConfig, LlmProvider};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// How the turn order is decided when play begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrder {
    /// Players take turns in the order they joined.
    #[default]
    JoinOrder,
    /// The order is shuffled at start.
    Shuffled,
}

/// Settings for the LLM-backed judgment service.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct LlmSettings {
    /// LLM provider (gemini, openai or anthropic).
    provider: LlmProvider,

    /// Model name.
    model: String,

    /// Maximum tokens for a judgment reply.
    max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 150,
        }
    }
}

impl LlmSettings {
    /// Creates the LLM client configuration.
    /// Requires GEMINI_API_KEY, OPENAI_API_KEY or ANTHROPIC_API_KEY to be set.
    #[instrument(skip(self), fields(provider = ?self.provider, model = %self.model))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        debug!("Creating LLM config");
        let var = self.provider.api_key_var();
        let api_key = std::env::var(var)
            .map_err(|_| ConfigError::new(format!("{var} environment variable not set")))?;

        Ok(LlmConfig::new(
            self.provider,
            api_key,
            self.model.clone(),
            self.max_tokens,
        ))
    }
}

/// Configuration for the game engine.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct EngineConfig {
    /// Players required to begin.
    min_players: usize,

    /// Seconds of play without a valid word before the game ends.
    idle_timeout_secs: u64,

    /// Bound on each judgment attempt, in milliseconds.
    gateway_timeout_ms: u64,

    /// Judgment attempts, initial one included.
    gateway_attempts: u32,

    /// Backoff before the first retry, in milliseconds.
    gateway_backoff_ms: u64,

    /// Backoff cap, in milliseconds.
    gateway_backoff_max_ms: u64,

    /// Accepted writing systems.
    scripts: Vec<Script>,

    /// Shortest acceptable word, in characters.
    min_word_len: usize,

    /// Longest acceptable word, in characters.
    max_word_len: usize,

    /// How linking units are read.
    linking: LinkingMode,

    /// Units that make the player producing them lose.
    terminal_units: Vec<String>,

    /// Accept words unjudged when the gateway is unavailable.
    degrade_on_unavailable: bool,

    /// Chain or association play.
    mode: GameMode,

    /// Only the host may start or end the game.
    host_controls: bool,

    /// Send the seed word through the gateway before starting.
    judge_seed_word: bool,

    /// Turn order policy.
    turn_order: TurnOrder,

    /// LLM judgment service settings.
    llm: LlmSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            idle_timeout_secs: 300,
            gateway_timeout_ms: 10_000,
            gateway_attempts: 2,
            gateway_backoff_ms: 500,
            gateway_backoff_max_ms: 4_000,
            scripts: vec![Script::Hiragana, Script::Katakana],
            min_word_len: 2,
            max_word_len: 20,
            linking: LinkingMode::Character,
            terminal_units: vec!["ん".to_string(), "ン".to_string(), "n".to_string()],
            degrade_on_unavailable: false,
            mode: GameMode::Chain,
            host_controls: true,
            judge_seed_word: true,
            turn_order: TurnOrder::JoinOrder,
            llm: LlmSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            min_players = config.min_players,
            linking = %config.linking,
            mode = %config.mode,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Rejects settings the engine cannot honour.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::new(format!(
                "min_players must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.gateway_attempts == 0 {
            return Err(ConfigError::new("gateway_attempts must be at least 1"));
        }
        if self.scripts.is_empty() {
            return Err(ConfigError::new("scripts must name at least one script"));
        }
        if self.min_word_len > self.max_word_len {
            return Err(ConfigError::new(format!(
                "min_word_len ({}) exceeds max_word_len ({})",
                self.min_word_len, self.max_word_len
            )));
        }
        Ok(())
    }

    /// Idle timeout as a duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Per-attempt gateway timeout as a duration.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
