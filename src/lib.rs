//! Shiritori library - multiplayer word-chain game engine
//!
//! Players in a channel take turns naming words; each word must start with
//! the sound the previous one ended on, may not repeat, and a word ending
//! in a losing sound (classically `ん`) knocks its author out. An external
//! referee (an LLM) judges whether each word is real.
//!
//! # Architecture
//!
//! - **Games**: the rules and the per-channel session state machine
//! - **Gateway**: timeout and retry policy around the remote referee
//! - **Engine**: async handlers serializing play per channel
//! - **Server**: JSON HTTP adapter over the engine
//!
//! # Example
//!
//! ```no_run
//! use shiritori::{EngineConfig, LlmClient, LlmJudge, Player, ShiritoriEngine};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EngineConfig::default();
//! let judge = LlmJudge::new(LlmClient::new(config.llm().create_llm_config()?));
//! let engine = ShiritoriEngine::new(config, Arc::new(judge));
//!
//! engine.handle_join("lobby", Player::new("alice", "Alice")).await?;
//! engine.handle_join("lobby", Player::new("bob", "Bob")).await?;
//! engine.handle_start("lobby", "しりとり", "alice", None).await?;
//! engine.handle_submission("lobby", "alice", "りんご").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod engine;
mod error;
mod games;
mod gateway;
mod llm_client;
mod llm_judge;
mod registry;
mod server;

// Crate-level exports - Configuration
pub use config::{ConfigError, EngineConfig, LlmSettings, TurnOrder};

// Crate-level exports - Engine
pub use engine::ShiritoriEngine;
pub use registry::{SessionHandle, SessionRegistry};

// Crate-level exports - Errors
pub use error::{FormatProblem, GameError};

// Crate-level exports - Gateway
pub use gateway::{
    GatewayVerdict, Judgment, JudgmentRequest, JudgmentService, RetryPolicy, SemanticGateway,
    ServiceError,
};

// Crate-level exports - LLM referee
pub use llm_client::{LlmClient, LlmConfig, LlmError, LlmProvider, is_retryable_status};
pub use llm_judge::{LlmJudge, parse_judgment};

// Crate-level exports - HTTP adapter
pub use server::{
    ApiError, ChannelList, EndRequest, JoinRequest, StartRequest, WordRequest, router, status_for,
};

// Crate-level exports - Game types (shiritori)
pub use games::shiritori::{
    ChainAcceptance, ChainValidator, ChannelId, Elimination, EndReason, GameMode, GameSession,
    Invariant, InvariantViolation, JoinReceipt, LONG_VOWEL_MARK, LexiconLedger,
    LinkedChainInvariant, LinkingMode, LinkingRule, PendingWord, Phase, Player, PlayerId, Script,
    SessionSnapshot, SingleTurnInvariant, StartReceipt, SubmissionOutcome, TurnSequencer,
    UniqueLedgerInvariant, WordEntry, WordFormat, check_invariants, fold_katakana,
};
