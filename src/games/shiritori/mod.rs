//! Shiritori: players take turns naming words that link to the previous one.

mod chain;
mod invariants;
mod ledger;
mod linking;
mod script;
mod session;
mod turns;
mod types;

pub use chain::{ChainAcceptance, ChainValidator};
pub use invariants::{
    check_invariants, Invariant, InvariantViolation, LinkedChainInvariant, SingleTurnInvariant,
    UniqueLedgerInvariant,
};
pub use ledger::LexiconLedger;
pub use linking::{fold_katakana, LinkingMode, LinkingRule};
pub use script::{Script, WordFormat, LONG_VOWEL_MARK};
pub use session::{
    GameSession, JoinReceipt, PendingWord, SessionSnapshot, StartReceipt, SubmissionOutcome,
};
pub use turns::{Elimination, TurnSequencer};
pub use types::{ChannelId, EndReason, GameMode, Phase, Player, PlayerId, WordEntry};
