//! The game engine: async handlers that adapters call.
//!
//! Each handler resolves the channel's session through the registry and
//! drives it through the session state machine. Submissions and game
//! starts are serialized per channel by the session's turn gate; `end`
//! and status reads are not, so they are honoured while a word is being
//! judged.

use crate::config::{EngineConfig, TurnOrder};
use crate::error::GameError;
use crate::games::shiritori::{
    ChannelId, JoinReceipt, Player, PlayerId, SessionSnapshot, StartReceipt, SubmissionOutcome,
};
use crate::gateway::{
    GatewayVerdict, JudgmentRequest, JudgmentService, RetryPolicy, SemanticGateway,
};
use crate::registry::{SessionHandle, SessionRegistry};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Shiritori game engine. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ShiritoriEngine {
    registry: Arc<SessionRegistry>,
    gateway: Arc<SemanticGateway>,
}

impl ShiritoriEngine {
    /// Creates an engine judging words with `service`.
    #[instrument(skip(config, service))]
    pub fn new(config: EngineConfig, service: Arc<dyn JudgmentService>) -> Self {
        info!(
            min_players = *config.min_players(),
            linking = %config.linking(),
            mode = %config.mode(),
            "Creating shiritori engine"
        );
        let gateway = SemanticGateway::new(service, RetryPolicy::from_config(&config));
        Self {
            registry: Arc::new(SessionRegistry::new(config)),
            gateway: Arc::new(gateway),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.registry.config()
    }

    /// The channel registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Adds a player to the channel's game, opening one if needed.
    #[instrument(skip(self, player), fields(player_id = %player.id()))]
    pub async fn handle_join(&self, channel: &str, player: Player) -> Result<JoinReceipt, GameError> {
        self.expire_idle(channel);
        let handle = self.registry.get_or_create(channel);
        let receipt = handle.with_session(|session| session.join(player))?;
        if receipt.roster_size == 1 {
            self.spawn_idle_watchdog(channel.to_string(), handle);
        }
        Ok(receipt)
    }

    /// Starts play with `seed_word` as the first word.
    #[instrument(skip(self, order))]
    pub async fn handle_start(
        &self,
        channel: &str,
        seed_word: &str,
        requester: &str,
        order: Option<Vec<PlayerId>>,
    ) -> Result<StartReceipt, GameError> {
        let handle = self.live(channel)?;
        let _gate = handle.turn_gate().await;

        let seed = handle.with_session(|session| session.check_begin(requester, seed_word))?;

        if *self.config().judge_seed_word() {
            let request = JudgmentRequest::new(seed.word.clone(), None, *self.config().mode());
            let verdict = handle
                .until_closed(self.gateway.judge(&request))
                .await
                .ok_or(GameError::SessionEnded)?;
            match verdict {
                GatewayVerdict::Approved { .. } => {}
                GatewayVerdict::Rejected { reason } => {
                    info!(seed = %seed.word, %reason, "Seed word rejected");
                    return Err(GameError::GatewayRejected { reason });
                }
                GatewayVerdict::Unavailable { attempts } if !*self.config().degrade_on_unavailable() => {
                    return Err(GameError::GatewayUnavailable { attempts });
                }
                GatewayVerdict::Unavailable { attempts } => {
                    warn!(attempts, "Seed word unjudged; starting anyway");
                }
            }
        }

        let order = order.or_else(|| self.shuffled_order(&handle));
        handle.with_session(|session| session.begin(requester, seed_word, order.as_deref()))
    }

    /// Plays a word for `player_id`.
    #[instrument(skip(self))]
    pub async fn handle_submission(
        &self,
        channel: &str,
        player_id: &str,
        word: &str,
    ) -> Result<SubmissionOutcome, GameError> {
        let handle = self.live(channel)?;
        let _gate = handle.turn_gate().await;

        let pending = handle.with_session(|session| {
            session.expire_if_idle(Instant::now());
            session.check_submission(player_id, word)
        });
        let pending = self.settle(channel, &handle, pending)?;

        let request = pending.request();
        let Some(verdict) = handle.until_closed(self.gateway.judge(&request)).await else {
            debug!(word = %request.word, "Session closed during judgment; verdict discarded");
            return Err(GameError::SessionEnded);
        };

        let outcome = handle.with_session(|session| session.resolve_submission(pending, verdict));
        self.settle(channel, &handle, outcome)
    }

    /// Calls off a game that has not started.
    #[instrument(skip(self))]
    pub async fn handle_cancel(&self, channel: &str, requester: &str) -> Result<SessionSnapshot, GameError> {
        let handle = self.live(channel)?;
        let snapshot = handle.with_session(|session| {
            session.cancel(requester)?;
            Ok(session.snapshot())
        });
        self.settle(channel, &handle, snapshot)
    }

    /// Ends the channel's game and returns its final state.
    #[instrument(skip(self))]
    pub async fn handle_end(&self, channel: &str, requester: &str) -> Result<SessionSnapshot, GameError> {
        let handle = self.live(channel)?;
        let snapshot = handle.with_session(|session| {
            session.end(requester)?;
            Ok(session.snapshot())
        });
        let snapshot = self.settle(channel, &handle, snapshot)?;
        info!(channel, end_reason = ?snapshot.end_reason, "Game ended on request");
        Ok(snapshot)
    }

    /// Current state of the channel's game.
    ///
    /// A game found idle past its timeout is ended here, and this call
    /// returns its final state.
    #[instrument(skip(self))]
    pub async fn get_status(&self, channel: &str) -> Result<SessionSnapshot, GameError> {
        let handle = self.registry.get(channel).ok_or(GameError::NoActiveGame)?;
        let snapshot = handle.with_session(|session| {
            session.expire_if_idle(Instant::now());
            session.snapshot()
        });
        self.settle(channel, &handle, Ok(snapshot))
    }

    /// Channels with a game that has not ended.
    #[instrument(skip(self))]
    pub async fn live_channels(&self) -> Vec<ChannelId> {
        self.registry
            .live_channels()
            .into_iter()
            .filter(|channel| self.live(channel).is_ok())
            .collect()
    }

    /// The channel's session, if it has not ended.
    fn live(&self, channel: &str) -> Result<Arc<SessionHandle>, GameError> {
        let handle = self.registry.get(channel).ok_or(GameError::NoActiveGame)?;
        if self.expire_handle(channel, &handle) {
            return Err(GameError::NoActiveGame);
        }
        Ok(handle)
    }

    /// Ends and retires the channel's session if it sat idle too long.
    fn expire_idle(&self, channel: &str) {
        if let Some(handle) = self.registry.get(channel) {
            self.expire_handle(channel, &handle);
        }
    }

    /// Expires `handle` if idle. Returns whether it has ended.
    fn expire_handle(&self, channel: &str, handle: &Arc<SessionHandle>) -> bool {
        handle.with_session(|session| session.expire_if_idle(Instant::now()));
        if handle.is_closed() {
            self.registry.retire(channel, handle);
            return true;
        }
        false
    }

    /// Retires the session from the registry once it has ended.
    fn settle<T>(
        &self,
        channel: &str,
        handle: &Arc<SessionHandle>,
        result: Result<T, GameError>,
    ) -> Result<T, GameError> {
        if handle.is_closed() {
            self.registry.retire(channel, handle);
        }
        result
    }

    fn shuffled_order(&self, handle: &SessionHandle) -> Option<Vec<PlayerId>> {
        if *self.config().turn_order() != TurnOrder::Shuffled {
            return None;
        }
        let mut ids: Vec<PlayerId> = handle.with_session(|session| {
            session.turns().roster().iter().map(|p| p.id().clone()).collect()
        });
        ids.shuffle(&mut rand::thread_rng());
        debug!(order = ?ids, "Shuffled turn order");
        Some(ids)
    }

    /// Ends the game once it has been idle past the timeout, from
    /// recruitment through play.
    fn spawn_idle_watchdog(&self, channel: ChannelId, handle: Arc<SessionHandle>) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            loop {
                let Some(deadline) = handle.with_session(|session| session.idle_deadline()) else {
                    break;
                };
                if handle
                    .until_closed(tokio::time::sleep_until(deadline))
                    .await
                    .is_none()
                {
                    break;
                }
                if handle.with_session(|session| session.expire_if_idle(Instant::now())) {
                    info!(%channel, "Idle watchdog ended game");
                    registry.retire(&channel, &handle);
                    break;
                }
            }
            debug!(%channel, "Idle watchdog stopped");
        });
    }
}
