//! Turn order: recruitment roster, rotation and elimination.

use super::types::{Player, PlayerId};
use crate::error::GameError;
use tracing::{debug, info, instrument};

/// Result of removing a player from rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elimination {
    /// Play continues; `next` now holds the turn.
    Continue {
        /// Player holding the turn after the elimination.
        next: Player,
    },
    /// A single player remains.
    GameOver {
        /// The remaining player.
        winner: Player,
    },
}

/// Maintains who plays and whose turn it is.
#[derive(Debug, Clone)]
pub struct TurnSequencer {
    min_players: usize,
    roster: Vec<Player>,
    order: Vec<Player>,
    eliminated: Vec<Player>,
    current: usize,
    frozen: bool,
}

impl TurnSequencer {
    /// Creates an open roster requiring `min_players` to start.
    #[instrument]
    pub fn new(min_players: usize) -> Self {
        Self {
            min_players,
            roster: Vec::new(),
            order: Vec::new(),
            eliminated: Vec::new(),
            current: 0,
            frozen: false,
        }
    }

    /// Adds a player to the recruiting roster.
    #[instrument(skip(self), fields(player_id = %player.id()))]
    pub fn join(&mut self, player: Player) -> Result<(), GameError> {
        if self.frozen {
            return Err(GameError::RosterClosed);
        }
        if self.roster.iter().any(|p| p.id() == player.id()) {
            return Err(GameError::AlreadyJoined);
        }
        self.roster.push(player);
        debug!(roster_size = self.roster.len(), "Player joined");
        Ok(())
    }

    /// Checks the roster size against the minimum without freezing it.
    pub fn check_ready(&self) -> Result<(), GameError> {
        if self.frozen {
            return Err(GameError::RosterClosed);
        }
        if self.roster.len() < self.min_players {
            return Err(GameError::TooFewPlayers {
                joined: self.roster.len(),
                required: self.min_players,
            });
        }
        Ok(())
    }

    /// Freezes the roster into a turn order.
    ///
    /// Players named in `order` go first, in that order; ids not on the
    /// roster are ignored and unnamed players follow in join order.
    #[instrument(skip(self))]
    pub fn start(&mut self, order: Option<&[PlayerId]>) -> Result<&[Player], GameError> {
        self.check_ready()?;

        let mut remaining = self.roster.clone();
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in order.unwrap_or_default() {
            if let Some(pos) = remaining.iter().position(|p| p.id() == id) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);

        self.order = ordered;
        self.current = 0;
        self.frozen = true;
        info!(players = self.order.len(), "Turn order frozen");
        Ok(&self.order)
    }

    /// Returns the player holding the turn, once play has started.
    pub fn current(&self) -> Option<&Player> {
        if !self.frozen {
            return None;
        }
        self.order.get(self.current)
    }

    /// Passes the turn to the next player in rotation.
    #[instrument(skip(self))]
    pub fn advance(&mut self) -> Option<&Player> {
        if !self.frozen || self.order.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.order.len();
        let next = self.order.get(self.current);
        debug!(next = ?next.map(|p| p.id()), "Turn advanced");
        next
    }

    /// Removes a player from rotation.
    ///
    /// The turn passes to whoever followed the eliminated player. Returns
    /// `None` if the player is not in rotation.
    #[instrument(skip(self))]
    pub fn eliminate(&mut self, player_id: &str) -> Option<Elimination> {
        let index = self.order.iter().position(|p| p.id() == player_id)?;
        let removed = self.order.remove(index);
        info!(player_id, remaining = self.order.len(), "Player eliminated");
        self.eliminated.push(removed);

        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.order.len() {
            self.current = 0;
        }

        match self.order.as_slice() {
            [] => None,
            [winner] => Some(Elimination::GameOver {
                winner: winner.clone(),
            }),
            _ => Some(Elimination::Continue {
                next: self.order[self.current].clone(),
            }),
        }
    }

    /// Recruited players, in join order.
    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    /// Players still in rotation, in turn order.
    pub fn order(&self) -> &[Player] {
        &self.order
    }

    /// Players knocked out so far.
    pub fn eliminated(&self) -> &[Player] {
        &self.eliminated
    }

    /// Whether the roster is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Checks whether a player was recruited.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.roster.iter().any(|p| p.id() == player_id)
    }
}
