//! Consistency checks run after every committed transition.
//!
//! A failed check aborts the session.

use super::linking::LinkingRule;
use super::session::GameSession;
use super::types::{GameMode, Phase};
use std::collections::HashSet;

/// A property every committed session state satisfies.
pub trait Invariant {
    /// Whether the property holds for `session`.
    fn holds(session: &GameSession) -> bool;

    /// What the property asserts.
    fn description() -> &'static str;
}

/// An invariant that failed to hold.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{}", description)]
pub struct InvariantViolation {
    /// The violated invariant's description.
    pub description: &'static str,
}

fn violation<I: Invariant>(session: &GameSession) -> Option<InvariantViolation> {
    (!I::holds(session)).then(|| InvariantViolation {
        description: I::description(),
    })
}

/// Checks every session invariant, collecting all that fail.
pub fn check_invariants(session: &GameSession) -> Result<(), Vec<InvariantViolation>> {
    let violations: Vec<_> = [
        violation::<UniqueLedgerInvariant>(session),
        violation::<LinkedChainInvariant>(session),
        violation::<SingleTurnInvariant>(session),
    ]
    .into_iter()
    .flatten()
    .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// No normalized word appears twice in the ledger.
pub struct UniqueLedgerInvariant;

impl Invariant for UniqueLedgerInvariant {
    fn holds(session: &GameSession) -> bool {
        let mut seen = HashSet::new();
        session
            .ledger()
            .entries()
            .iter()
            .all(|entry| seen.insert(entry.normalized()))
    }

    fn description() -> &'static str {
        "Ledger holds no duplicate normalized word"
    }
}

/// Every consecutive pair of played words links.
pub struct LinkedChainInvariant;

impl Invariant for LinkedChainInvariant {
    fn holds(session: &GameSession) -> bool {
        if session.mode() == GameMode::Association {
            return true;
        }
        let rule = session.validator().linking();
        session.ledger().entries().windows(2).all(|pair| {
            let leading = rule.leading_unit(pair[1].text());
            leading.as_deref() == Some(pair[0].trailing_unit().as_str())
        })
    }

    fn description() -> &'static str {
        "Each word starts with the previous word's trailing unit"
    }
}

/// Exactly one player holds the turn while active, none otherwise.
pub struct SingleTurnInvariant;

impl Invariant for SingleTurnInvariant {
    fn holds(session: &GameSession) -> bool {
        let turns = session.turns();
        match session.phase() {
            Phase::Active => {
                let Some(current) = turns.current() else {
                    return false;
                };
                turns.order().iter().filter(|p| p.id() == current.id()).count() == 1
            }
            Phase::Recruiting => turns.current().is_none(),
            Phase::Ended => true,
        }
    }

    fn description() -> &'static str {
        "Exactly one player holds the turn during play"
    }
}
