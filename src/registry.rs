//! Channel registry: at most one live session per channel.

use crate::config::EngineConfig;
use crate::games::shiritori::{ChannelId, GameSession};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, instrument, warn};

/// Shared handle to one channel's session.
///
/// Submissions for a channel are serialized through the turn gate, which
/// is held across the whole check/judge/commit pipeline. Session state
/// itself sits behind a plain mutex that is never held across `.await`.
#[derive(Debug)]
pub struct SessionHandle {
    session: Mutex<GameSession>,
    turn_gate: AsyncMutex<()>,
    closed: watch::Sender<bool>,
}

impl SessionHandle {
    /// Wraps a fresh session.
    pub fn new(session: GameSession) -> Self {
        let (closed, _) = watch::channel(session.is_ended());
        Self {
            session: Mutex::new(session),
            turn_gate: AsyncMutex::new(()),
            closed,
        }
    }

    /// Runs `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        let mut guard = self.lock();
        let result = f(&mut guard);
        let ended = guard.is_ended();
        drop(guard);
        if ended {
            self.close();
        }
        result
    }

    /// Waits for this channel's turn gate (FIFO).
    pub async fn turn_gate(&self) -> AsyncMutexGuard<'_, ()> {
        self.turn_gate.lock().await
    }

    /// Signals that the session has ended.
    pub fn close(&self) {
        self.closed.send_if_modified(|closed| !std::mem::replace(closed, true));
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Runs `fut` unless the session closes first.
    pub async fn until_closed<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut closed = self.closed.subscribe();
        tokio::select! {
            output = fut => Some(output),
            _ = closed.wait_for(|c| *c) => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!("Session lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

/// Maps channels to their live session.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ChannelId, Arc<SessionHandle>>>,
    config: EngineConfig,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument(skip(config))]
    pub fn new(config: EngineConfig) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Configuration new sessions are created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the channel's session, creating one if there is none live.
    #[instrument(skip(self))]
    pub fn get_or_create(&self, channel: &str) -> Arc<SessionHandle> {
        let mut sessions = self.lock();
        if let Some(handle) = sessions.get(channel)
            && !handle.is_closed()
        {
            return Arc::clone(handle);
        }
        let handle = Arc::new(SessionHandle::new(GameSession::new(
            channel.to_string(),
            &self.config,
        )));
        if sessions.insert(channel.to_string(), Arc::clone(&handle)).is_some() {
            debug!(channel, "Replaced ended session");
        }
        handle
    }

    /// Returns the channel's session, if any.
    pub fn get(&self, channel: &str) -> Option<Arc<SessionHandle>> {
        self.lock().get(channel).cloned()
    }

    /// Removes the channel's session.
    #[instrument(skip(self))]
    pub fn remove(&self, channel: &str) -> Option<Arc<SessionHandle>> {
        let removed = self.lock().remove(channel);
        if removed.is_some() {
            info!(channel, "Session removed");
        }
        removed
    }

    /// Removes `handle` if it is still the channel's session.
    #[instrument(skip(self, handle))]
    pub fn retire(&self, channel: &str, handle: &Arc<SessionHandle>) -> bool {
        let mut sessions = self.lock();
        match sessions.get(channel) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(channel);
                info!(channel, "Session retired");
                true
            }
            _ => false,
        }
    }

    /// Channels with a session that has not ended.
    pub fn live_channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_closed())
            .map(|(channel, _)| channel.clone())
            .collect();
        channels.sort();
        channels
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelId, Arc<SessionHandle>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| {
            warn!("Registry lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}
