//! The game session state machine.
//!
//! `Recruiting -> Active -> Ended`. The session is synchronous: the engine
//! splits a submission into [`GameSession::check_submission`] (local rules,
//! no mutation), the gateway call, and [`GameSession::resolve_submission`]
//! (commit). The turn serial taken at check time must still match at
//! resolve time; anything else is a consistency fault.

use super::chain::{ChainAcceptance, ChainValidator};
use super::invariants::check_invariants;
use super::ledger::LexiconLedger;
use super::turns::{Elimination, TurnSequencer};
use super::types::{ChannelId, EndReason, GameMode, Phase, Player, PlayerId, WordEntry};
use crate::config::EngineConfig;
use crate::error::GameError;
use crate::gateway::{GatewayVerdict, JudgmentRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Returned when a player joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    /// The player who joined.
    pub player: Player,
    /// Host of the session.
    pub host: PlayerId,
    /// Players recruited so far.
    pub roster_size: usize,
    /// Whether enough players have joined to begin.
    pub ready: bool,
}

/// Returned when play begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReceipt {
    /// Frozen turn order.
    pub order: Vec<Player>,
    /// The seed word.
    pub seed_word: String,
    /// Player holding the first turn.
    pub first_player: Player,
    /// Unit the first word must start with (chain mode only).
    pub next_unit: Option<String>,
}

/// Result of a submission that reached a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The word was recorded and the turn moved on.
    Accepted {
        /// The recorded word.
        word: String,
        /// Player holding the turn now.
        next_player: Player,
        /// Unit the next word must start with (chain mode only).
        next_unit: Option<String>,
        /// Accepted without a judgment because the gateway was unavailable.
        degraded: bool,
    },
    /// The word ended in a losing unit; its author is out, play continues.
    Eliminated {
        /// The losing word (not recorded).
        word: String,
        /// The eliminated player.
        loser: Player,
        /// Player holding the turn now.
        next_player: Player,
        /// Unit the next word must start with, unchanged.
        next_unit: Option<String>,
        /// Accepted without a judgment because the gateway was unavailable.
        degraded: bool,
    },
    /// The word ended in a losing unit and one player remains.
    Won {
        /// The losing word (not recorded).
        word: String,
        /// The eliminated player.
        loser: Player,
        /// The last player standing.
        winner: Player,
        /// Accepted without a judgment because the gateway was unavailable.
        degraded: bool,
    },
}

/// A submission that passed the local rules and awaits judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWord {
    player: PlayerId,
    acceptance: ChainAcceptance,
    previous: Option<String>,
    mode: GameMode,
    turn_serial: u64,
}

impl PendingWord {
    /// The candidate word.
    pub fn word(&self) -> &str {
        &self.acceptance.word
    }

    /// The submitting player.
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Whether the word ends in a losing unit.
    pub fn is_terminal(&self) -> bool {
        self.acceptance.terminal
    }

    /// Builds the judgment request for this word.
    pub fn request(&self) -> JudgmentRequest {
        JudgmentRequest::new(self.acceptance.word.clone(), self.previous.clone(), self.mode)
    }
}

/// Point-in-time view of a session, for adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Channel the session lives in.
    pub channel: ChannelId,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Game mode.
    pub mode: GameMode,
    /// Host (first player to join).
    pub host: Option<PlayerId>,
    /// Turn order during play, recruits before.
    pub roster: Vec<Player>,
    /// Players knocked out.
    pub eliminated: Vec<Player>,
    /// Player holding the turn.
    pub current_turn: Option<PlayerId>,
    /// Words played, seed included.
    pub used_word_count: usize,
    /// Every recorded word in play order, seed first.
    pub words: Vec<WordEntry>,
    /// Last accepted word.
    pub last_word: Option<String>,
    /// Unit the next word must start with (chain mode only).
    pub next_unit: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When play began.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Why the session ended.
    pub end_reason: Option<EndReason>,
}

/// One game occurrence in one channel.
#[derive(Debug, Clone)]
pub struct GameSession {
    channel: ChannelId,
    phase: Phase,
    mode: GameMode,
    host: Option<PlayerId>,
    turns: TurnSequencer,
    ledger: LexiconLedger,
    validator: ChainValidator,
    host_controls: bool,
    degrade_on_unavailable: bool,
    idle_timeout: Duration,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    end_reason: Option<EndReason>,
    last_activity: Instant,
    turn_serial: u64,
}

impl GameSession {
    /// Creates a recruiting session.
    #[instrument(skip(config))]
    pub fn new(channel: ChannelId, config: &EngineConfig) -> Self {
        info!(%channel, "Creating new game session");
        let validator = ChainValidator::new(
            config.scripts().clone(),
            *config.min_word_len(),
            *config.max_word_len(),
            *config.linking(),
            config.terminal_units(),
            *config.mode(),
        );
        Self {
            channel,
            phase: Phase::Recruiting,
            mode: *config.mode(),
            host: None,
            turns: TurnSequencer::new(*config.min_players()),
            ledger: LexiconLedger::new(*config.linking()),
            validator,
            host_controls: *config.host_controls(),
            degrade_on_unavailable: *config.degrade_on_unavailable(),
            idle_timeout: config.idle_timeout(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            end_reason: None,
            last_activity: Instant::now(),
            turn_serial: 0,
        }
    }

    /// Recruits a player. The first player to join becomes host.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn join(&mut self, player: Player) -> Result<JoinReceipt, GameError> {
        match self.phase {
            Phase::Recruiting => {}
            Phase::Active => return Err(GameError::RosterClosed),
            Phase::Ended => return Err(GameError::SessionEnded),
        }
        self.turns.join(player.clone())?;
        self.touch();
        let host = self.host.get_or_insert_with(|| player.id().clone()).clone();
        let roster_size = self.turns.roster().len();
        let ready = self.turns.check_ready().is_ok();
        info!(player_id = %player.id(), roster_size, ready, "Player joined session");
        Ok(JoinReceipt {
            player,
            host,
            roster_size,
            ready,
        })
    }

    /// Checks every precondition of [`GameSession::begin`] without mutating.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn check_begin(&self, requester: &str, seed_word: &str) -> Result<ChainAcceptance, GameError> {
        match self.phase {
            Phase::Recruiting => {}
            Phase::Active => return Err(GameError::RosterClosed),
            Phase::Ended => return Err(GameError::SessionEnded),
        }
        self.authorize(requester)?;
        self.turns.check_ready()?;

        let seed = self.validator.check_standalone(seed_word)?;
        if seed.terminal {
            debug!(seed = %seed.word, "Seed ends in a terminal unit");
            return Err(GameError::TerminalSeed(seed.word));
        }
        Ok(seed)
    }

    /// Freezes the turn order, records the seed word and starts play.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn begin(
        &mut self,
        requester: &str,
        seed_word: &str,
        order: Option<&[PlayerId]>,
    ) -> Result<StartReceipt, GameError> {
        let seed = self.check_begin(requester, seed_word)?;
        let order = self.turns.start(order)?.to_vec();

        let entry = WordEntry::new(
            seed.word.clone(),
            seed.normalized,
            seed.trailing_unit,
            None,
        );
        self.ledger.record(entry)?;

        self.phase = Phase::Active;
        self.started_at = Some(Utc::now());
        self.touch();
        self.turn_serial += 1;
        self.verify()?;

        let first_player = self
            .turns
            .current()
            .cloned()
            .ok_or(GameError::SessionAborted)?;
        info!(seed = %seed.word, first = %first_player.id(), "Game started");
        Ok(StartReceipt {
            order,
            seed_word: seed.word,
            first_player,
            next_unit: self.next_unit(),
        })
    }

    /// Calls off recruitment.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn cancel(&mut self, requester: &str) -> Result<(), GameError> {
        match self.phase {
            Phase::Recruiting => {}
            Phase::Active => return Err(GameError::RosterClosed),
            Phase::Ended => return Err(GameError::SessionEnded),
        }
        self.authorize(requester)?;
        self.finish(EndReason::Cancelled);
        Ok(())
    }

    /// Ends the session from any live phase, with no winner.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn end(&mut self, requester: &str) -> Result<EndReason, GameError> {
        let reason = match self.phase {
            Phase::Recruiting => EndReason::Cancelled,
            Phase::Active => EndReason::Forced,
            Phase::Ended => return Err(GameError::SessionEnded),
        };
        self.authorize(requester)?;
        self.finish(reason.clone());
        Ok(reason)
    }

    /// Applies the local rules to a submission without mutating anything.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn check_submission(&self, player_id: &str, word: &str) -> Result<PendingWord, GameError> {
        match self.phase {
            Phase::Active => {}
            Phase::Recruiting => return Err(GameError::NotInProgress),
            Phase::Ended => return Err(GameError::SessionEnded),
        }

        let current = self.turns.current().ok_or(GameError::NotInProgress)?;
        if current.id() != player_id {
            debug!(player_id, current = %current.id(), "Out-of-turn submission");
            return Err(GameError::NotYourTurn {
                current: current.id().clone(),
            });
        }

        let candidate = self.validator.check_standalone(word)?;
        if self.ledger.contains(&candidate.word) {
            return Err(GameError::AlreadyUsed(candidate.word));
        }

        let previous = self.ledger.last().map(|entry| entry.text().clone());
        let acceptance = match &previous {
            Some(previous) => self.validator.validate(previous, &candidate.word)?,
            None => candidate,
        };

        Ok(PendingWord {
            player: player_id.to_string(),
            acceptance,
            previous,
            mode: self.mode,
            turn_serial: self.turn_serial,
        })
    }

    /// Applies the gateway's verdict to a checked submission.
    #[instrument(skip(self, pending), fields(channel = %self.channel, word = %pending.word()))]
    pub fn resolve_submission(
        &mut self,
        pending: PendingWord,
        verdict: GatewayVerdict,
    ) -> Result<SubmissionOutcome, GameError> {
        if self.phase == Phase::Ended {
            debug!("Session ended while the word was being judged; discarding verdict");
            return Err(GameError::SessionEnded);
        }

        let current = self.turns.current().map(|p| p.id().clone());
        if self.phase != Phase::Active
            || pending.turn_serial != self.turn_serial
            || current.as_deref() != Some(pending.player.as_str())
        {
            self.abort(&format!(
                "submission raced past the turn gate: pending serial {} by {}, session serial {} held by {:?}",
                pending.turn_serial, pending.player, self.turn_serial, current
            ));
            return Err(GameError::SessionAborted);
        }

        let degraded = match verdict {
            GatewayVerdict::Approved { .. } => false,
            GatewayVerdict::Rejected { reason } => {
                info!(player_id = %pending.player, %reason, "Word rejected; turn forfeited");
                self.pass_turn();
                return Err(GameError::GatewayRejected { reason });
            }
            GatewayVerdict::Unavailable { attempts } if !self.degrade_on_unavailable => {
                warn!(attempts, "Judgment unavailable; player may resubmit");
                return Err(GameError::GatewayUnavailable { attempts });
            }
            GatewayVerdict::Unavailable { attempts } => {
                warn!(attempts, "Judgment unavailable; accepting with degraded confidence");
                true
            }
        };

        let outcome = if pending.acceptance.terminal {
            self.eliminate_submitter(pending, degraded)?
        } else {
            self.commit_word(pending, degraded)?
        };
        self.verify()?;
        Ok(outcome)
    }

    /// Ends the session if it has been idle past the timeout.
    ///
    /// An abandoned recruitment is cancelled; idle play ends with
    /// [`EndReason::IdleTimeout`].
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        match self.idle_deadline() {
            Some(deadline) if now >= deadline => {
                let reason = match self.phase {
                    Phase::Recruiting => EndReason::Cancelled,
                    _ => EndReason::IdleTimeout,
                };
                info!(idle_timeout = ?self.idle_timeout, ?reason, "Idle timeout reached; ending game");
                self.finish(reason);
                true
            }
            _ => false,
        }
    }

    /// When the session will time out. `None` once ended, or when the
    /// timeout lies beyond what the clock can represent.
    pub fn idle_deadline(&self) -> Option<Instant> {
        if self.phase == Phase::Ended {
            return None;
        }
        self.last_activity.checked_add(self.idle_timeout)
    }

    /// Aborts the session after a consistency fault, logging full context.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn abort(&mut self, context: &str) {
        error!(
            channel = %self.channel,
            phase = %self.phase,
            turn_serial = self.turn_serial,
            current = ?self.turns.current().map(|p| p.id()),
            order = ?self.turns.order().iter().map(|p| p.id()).collect::<Vec<_>>(),
            words = ?self.ledger.entries().iter().map(|e| e.text()).collect::<Vec<_>>(),
            context,
            "Session consistency fault; aborting session"
        );
        self.finish(EndReason::Aborted);
    }

    /// Returns a point-in-time view of the session.
    #[instrument(skip(self), fields(channel = %self.channel))]
    pub fn snapshot(&self) -> SessionSnapshot {
        let roster = if self.turns.is_frozen() {
            self.turns.order().to_vec()
        } else {
            self.turns.roster().to_vec()
        };
        SessionSnapshot {
            channel: self.channel.clone(),
            phase: self.phase,
            mode: self.mode,
            host: self.host.clone(),
            roster,
            eliminated: self.turns.eliminated().to_vec(),
            current_turn: match self.phase {
                Phase::Active => self.turns.current().map(|p| p.id().clone()),
                _ => None,
            },
            used_word_count: self.ledger.len(),
            words: self.ledger.entries().to_vec(),
            last_word: self.ledger.last().map(|e| e.text().clone()),
            next_unit: self.next_unit(),
            created_at: self.created_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            end_reason: self.end_reason.clone(),
        }
    }

    /// Channel the session lives in.
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Game mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Host of the session.
    pub fn host(&self) -> Option<&PlayerId> {
        self.host.as_ref()
    }

    /// Turn order and roster.
    pub fn turns(&self) -> &TurnSequencer {
        &self.turns
    }

    /// Words played.
    pub fn ledger(&self) -> &LexiconLedger {
        &self.ledger
    }

    /// The chain validator.
    pub fn validator(&self) -> &ChainValidator {
        &self.validator
    }

    /// Why the session ended.
    pub fn end_reason(&self) -> Option<&EndReason> {
        self.end_reason.as_ref()
    }

    /// Whether the session has reached its terminal phase.
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    fn authorize(&self, requester: &str) -> Result<(), GameError> {
        if self.host_controls && self.host.as_deref() != Some(requester) {
            debug!(requester, host = ?self.host, "Requester is not the host");
            return Err(GameError::NotHost);
        }
        Ok(())
    }

    fn next_unit(&self) -> Option<String> {
        if self.mode == GameMode::Association {
            return None;
        }
        self.ledger.last().map(|e| e.trailing_unit().clone())
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn pass_turn(&mut self) {
        self.turns.advance();
        self.turn_serial += 1;
    }

    fn finish(&mut self, reason: EndReason) {
        info!(channel = %self.channel, reason = ?reason, "Session ended");
        self.phase = Phase::Ended;
        self.ended_at = Some(Utc::now());
        self.end_reason = Some(reason);
    }

    fn commit_word(&mut self, pending: PendingWord, degraded: bool) -> Result<SubmissionOutcome, GameError> {
        let ChainAcceptance {
            word,
            normalized,
            trailing_unit,
            ..
        } = pending.acceptance;
        let entry = WordEntry::new(word.clone(), normalized, trailing_unit, Some(pending.player));
        if let Err(e) = self.ledger.record(entry) {
            self.abort(&format!("checked word failed to record: {e}"));
            return Err(GameError::SessionAborted);
        }

        self.pass_turn();
        self.touch();
        let next_player = self
            .turns
            .current()
            .cloned()
            .ok_or(GameError::SessionAborted)?;
        info!(%word, next = %next_player.id(), degraded, "Word accepted");
        Ok(SubmissionOutcome::Accepted {
            word,
            next_player,
            next_unit: self.next_unit(),
            degraded,
        })
    }

    fn eliminate_submitter(&mut self, pending: PendingWord, degraded: bool) -> Result<SubmissionOutcome, GameError> {
        let word = pending.acceptance.word;
        let loser = self
            .turns
            .order()
            .iter()
            .find(|p| *p.id() == pending.player)
            .cloned();
        let (Some(loser), Some(elimination)) = (loser, self.turns.eliminate(&pending.player)) else {
            self.abort("submitter missing from rotation at elimination");
            return Err(GameError::SessionAborted);
        };

        self.turn_serial += 1;
        self.touch();
        match elimination {
            Elimination::GameOver { winner } => {
                info!(%word, loser = %loser.id(), winner = %winner.id(), "Terminal word; game won");
                self.finish(EndReason::Won {
                    winner: winner.clone(),
                });
                Ok(SubmissionOutcome::Won {
                    word,
                    loser,
                    winner,
                    degraded,
                })
            }
            Elimination::Continue { next } => {
                info!(%word, loser = %loser.id(), next = %next.id(), "Terminal word; player eliminated");
                Ok(SubmissionOutcome::Eliminated {
                    word,
                    loser,
                    next_player: next,
                    next_unit: self.next_unit(),
                    degraded,
                })
            }
        }
    }

    fn verify(&mut self) -> Result<(), GameError> {
        if let Err(violations) = check_invariants(self) {
            let described: Vec<_> = violations.iter().map(ToString::to_string).collect();
            self.abort(&format!("invariants violated: {}", described.join("; ")));
            return Err(GameError::SessionAborted);
        }
        Ok(())
    }
}
