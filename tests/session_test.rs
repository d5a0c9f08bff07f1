//! Tests for the session state machine, without the async engine.

use shiritori::{
    EndReason, EngineConfig, GameError, GameSession, GatewayVerdict, Phase, Player,
    SubmissionOutcome, check_invariants,
};
use std::time::Duration;
use tokio::time::Instant;

fn approved() -> GatewayVerdict {
    GatewayVerdict::Approved {
        reason: "ok".to_string(),
    }
}

fn active_session() -> GameSession {
    let mut session = GameSession::new("room".to_string(), &EngineConfig::default());
    session.join(Player::new("alice", "Alice")).unwrap();
    session.join(Player::new("bob", "Bob")).unwrap();
    session.begin("alice", "しりとり", None).unwrap();
    session
}

fn play(session: &mut GameSession, player: &str, word: &str) -> Result<SubmissionOutcome, GameError> {
    let pending = session.check_submission(player, word)?;
    session.resolve_submission(pending, approved())
}

#[test]
fn test_first_joiner_hosts() {
    let mut session = GameSession::new("room".to_string(), &EngineConfig::default());
    let first = session.join(Player::new("alice", "Alice")).unwrap();
    assert_eq!(first.host, "alice");
    assert!(!first.ready);

    let second = session.join(Player::new("bob", "Bob")).unwrap();
    assert_eq!(second.host, "alice");
    assert_eq!(second.roster_size, 2);
    assert!(second.ready);
}

#[test]
fn test_begin_records_seed() {
    let session = active_session();
    assert_eq!(session.phase(), Phase::Active);
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.ledger().entries()[0].submitted_by(), &None);
    assert_eq!(session.snapshot().next_unit.as_deref(), Some("り"));
}

#[test]
fn test_submission_before_start_is_not_in_progress() {
    let mut session = GameSession::new("room".to_string(), &EngineConfig::default());
    session.join(Player::new("alice", "Alice")).unwrap();
    assert_eq!(
        session.check_submission("alice", "りんご"),
        Err(GameError::NotInProgress)
    );
}

#[test]
fn test_check_does_not_mutate() {
    let session = active_session();
    let before = session.snapshot();
    let pending = session.check_submission("alice", "りす").unwrap();
    assert_eq!(pending.word(), "りす");
    assert_eq!(pending.player(), "alice");
    assert!(!pending.is_terminal());
    assert_eq!(pending.request().previous.as_deref(), Some("しりとり"));
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_unavailable_verdict_keeps_turn() {
    let mut session = active_session();
    let pending = session.check_submission("alice", "りす").unwrap();
    assert_eq!(
        session.resolve_submission(pending, GatewayVerdict::Unavailable { attempts: 2 }),
        Err(GameError::GatewayUnavailable { attempts: 2 })
    );
    assert_eq!(session.ledger().len(), 1);
    assert_eq!(session.turns().current().map(|p| p.id().as_str()), Some("alice"));
}

#[test]
fn test_invariants_hold_through_play() {
    let mut session = active_session();
    play(&mut session, "alice", "りす").unwrap();
    play(&mut session, "bob", "すいか").unwrap();
    play(&mut session, "alice", "かめ").unwrap();
    assert!(check_invariants(&session).is_ok());
    assert_eq!(session.ledger().len(), 4);
}

#[test]
fn test_stale_pending_word_aborts_session() {
    let mut session = active_session();
    let first = session.check_submission("alice", "りす").unwrap();
    let stale = session.check_submission("alice", "りんご").unwrap();

    session.resolve_submission(first, approved()).unwrap();
    assert_eq!(
        session.resolve_submission(stale, approved()),
        Err(GameError::SessionAborted)
    );
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.end_reason(), Some(&EndReason::Aborted));
    assert_eq!(session.ledger().len(), 2);
}

#[test]
fn test_verdict_after_end_is_discarded() {
    let mut session = active_session();
    let pending = session.check_submission("alice", "りす").unwrap();
    assert_eq!(session.end("alice"), Ok(EndReason::Forced));
    assert_eq!(
        session.resolve_submission(pending, approved()),
        Err(GameError::SessionEnded)
    );
    assert_eq!(session.ledger().len(), 1);
}

#[test]
fn test_end_from_recruiting_cancels() {
    let mut session = GameSession::new("room".to_string(), &EngineConfig::default());
    session.join(Player::new("alice", "Alice")).unwrap();
    assert_eq!(session.end("mallory"), Err(GameError::NotHost));
    assert_eq!(session.end("alice"), Ok(EndReason::Cancelled));
    assert_eq!(session.end("alice"), Err(GameError::SessionEnded));
}

#[test]
fn test_host_controls_can_be_disabled() {
    let config = EngineConfig::default().with_host_controls(false);
    let mut session = GameSession::new("room".to_string(), &config);
    session.join(Player::new("alice", "Alice")).unwrap();
    session.join(Player::new("bob", "Bob")).unwrap();
    assert!(session.begin("bob", "しりとり", None).is_ok());
}

#[test]
fn test_idle_expiry() {
    let mut session = active_session();
    let deadline = session.idle_deadline().unwrap();
    assert!(!session.expire_if_idle(deadline - Duration::from_secs(1)));
    assert_eq!(session.phase(), Phase::Active);

    assert!(session.expire_if_idle(Instant::now() + Duration::from_secs(301)));
    assert_eq!(session.end_reason(), Some(&EndReason::IdleTimeout));
    assert_eq!(session.idle_deadline(), None);
    assert!(session.snapshot().current_turn.is_none());
}

#[test]
fn test_terminal_word_is_not_recorded() {
    let mut session = active_session();
    play(&mut session, "alice", "りす").unwrap();
    let outcome = play(&mut session, "bob", "すいはん").unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Won { .. }));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, Phase::Ended);
    assert_eq!(snapshot.used_word_count, 2);
    assert_eq!(snapshot.last_word.as_deref(), Some("りす"));
    assert_eq!(
        snapshot
            .end_reason
            .as_ref()
            .and_then(EndReason::winner)
            .map(|p| p.id().as_str()),
        Some("alice")
    );
}

#[test]
fn test_unbounded_idle_timeout_has_no_deadline() {
    let config = EngineConfig::default().with_idle_timeout_secs(u64::MAX);
    let mut session = GameSession::new("room".to_string(), &config);
    session.join(Player::new("alice", "Alice")).unwrap();
    session.join(Player::new("bob", "Bob")).unwrap();
    assert_eq!(session.idle_deadline(), None);

    session.begin("alice", "しりとり", None).unwrap();
    assert_eq!(session.idle_deadline(), None);
    assert!(!session.expire_if_idle(Instant::now() + Duration::from_secs(86_400)));
    assert_eq!(session.phase(), Phase::Active);
}

#[test]
fn test_abandoned_recruitment_is_cancelled() {
    let mut session = GameSession::new("room".to_string(), &EngineConfig::default());
    session.join(Player::new("alice", "Alice")).unwrap();
    assert!(session.idle_deadline().is_some());

    assert!(session.expire_if_idle(Instant::now() + Duration::from_secs(301)));
    assert_eq!(session.end_reason(), Some(&EndReason::Cancelled));
}

#[test]
fn test_snapshot_lists_words_in_play_order() {
    let mut session = active_session();
    play(&mut session, "alice", "りす").unwrap();
    play(&mut session, "bob", "すいか").unwrap();

    let words = session.snapshot().words;
    let texts: Vec<_> = words.iter().map(|w| w.text().as_str()).collect();
    assert_eq!(texts, vec!["しりとり", "りす", "すいか"]);
    assert_eq!(words[0].submitted_by(), &None);
    assert_eq!(words[1].submitted_by().as_deref(), Some("alice"));
    assert_eq!(words[2].submitted_by().as_deref(), Some("bob"));
}
