//! Tests for the channel registry.

mod common;

use common::{kana_config, ScriptedReferee};
use shiritori::{EngineConfig, Player, SessionRegistry, ShiritoriEngine};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_yields_one_session() {
    let registry = Arc::new(SessionRegistry::new(EngineConfig::default()));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_create("room") })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    let first = &handles[0];
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, first)));
    assert_eq!(registry.live_channels(), vec!["room"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_share_one_roster() {
    let engine = ShiritoriEngine::new(kana_config(), ScriptedReferee::approving());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let id = format!("player{i}");
                engine.handle_join("room", Player::new(&id, &id)).await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let status = engine.get_status("room").await.unwrap();
    assert_eq!(status.roster.len(), 8);
    assert!(status.host.is_some());
    assert_eq!(engine.live_channels().await, vec!["room"]);
}

#[test]
fn test_retire_ignores_stale_handle() {
    let registry = SessionRegistry::new(EngineConfig::default());
    let stale = registry.get_or_create("room");
    stale.with_session(|session| {
        session.join(Player::new("alice", "Alice")).unwrap();
        session.end("alice").unwrap();
    });
    assert!(stale.is_closed());

    let fresh = registry.get_or_create("room");
    assert!(!Arc::ptr_eq(&stale, &fresh));

    assert!(!registry.retire("room", &stale));
    assert!(registry.get("room").is_some_and(|h| Arc::ptr_eq(&h, &fresh)));

    assert!(registry.retire("room", &fresh));
    assert!(registry.get("room").is_none());
}

#[test]
fn test_get_or_create_keeps_live_session() {
    let registry = SessionRegistry::new(EngineConfig::default());
    let first = registry.get_or_create("room");
    first.with_session(|session| session.join(Player::new("alice", "Alice")).unwrap());

    let again = registry.get_or_create("room");
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(again.with_session(|session| session.turns().roster().len()), 1);
}

#[test]
fn test_remove_and_live_channels() {
    let registry = SessionRegistry::new(EngineConfig::default());
    registry.get_or_create("b");
    registry.get_or_create("a");
    assert_eq!(registry.live_channels(), vec!["a", "b"]);

    assert!(registry.remove("a").is_some());
    assert!(registry.remove("a").is_none());
    assert_eq!(registry.live_channels(), vec!["b"]);
}
