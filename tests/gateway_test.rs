//! Tests for the gateway's timeout and retry policy.

mod common;

use common::{Reply, ScriptedReferee};
use shiritori::{
    EngineConfig, GameMode, GatewayVerdict, JudgmentRequest, RetryPolicy, SemanticGateway,
};
use std::time::Duration;

fn request() -> JudgmentRequest {
    JudgmentRequest::new("りんご".to_string(), Some("しりとり".to_string()), GameMode::Chain)
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_secs(5),
        max_attempts,
        initial_backoff: Duration::from_millis(200),
        max_backoff: Duration::from_secs(1),
    }
}

#[tokio::test]
async fn test_approval_passes_through() {
    let referee = ScriptedReferee::approving();
    let gateway = SemanticGateway::new(referee.clone(), policy(3));
    assert!(matches!(
        gateway.judge(&request()).await,
        GatewayVerdict::Approved { .. }
    ));
    assert_eq!(referee.requests(), vec![request()]);
}

#[tokio::test]
async fn test_rejection_is_never_retried() {
    let referee = ScriptedReferee::new([Reply::Reject("not a word")]);
    let gateway = SemanticGateway::new(referee.clone(), policy(3));
    assert_eq!(
        gateway.judge(&request()).await,
        GatewayVerdict::Rejected {
            reason: "not a word".to_string()
        }
    );
    assert_eq!(referee.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried() {
    let referee = ScriptedReferee::new([Reply::Transient, Reply::Hang]);
    let gateway = SemanticGateway::new(referee.clone(), policy(3));
    assert!(matches!(
        gateway.judge(&request()).await,
        GatewayVerdict::Approved { .. }
    ));
    assert_eq!(referee.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_attempts_are_unavailable() {
    let referee = ScriptedReferee::new([Reply::Hang, Reply::Transient]);
    let gateway = SemanticGateway::new(referee.clone(), policy(2));
    assert_eq!(
        gateway.judge(&request()).await,
        GatewayVerdict::Unavailable { attempts: 2 }
    );
    assert_eq!(referee.calls(), 2);
}

#[test]
fn test_backoff_is_jittered_and_capped() {
    let policy = policy(5);
    for _ in 0..50 {
        let first = policy.backoff(0);
        assert!(first <= Duration::from_millis(200));
        assert!(first >= Duration::from_millis(150));

        let late = policy.backoff(10);
        assert!(late <= Duration::from_secs(1));
        assert!(late >= Duration::from_millis(750));
    }
}

#[test]
fn test_policy_from_config() {
    let config = EngineConfig::default()
        .with_gateway_timeout_ms(2_500)
        .with_gateway_attempts(4);
    let policy = RetryPolicy::from_config(&config);
    assert_eq!(policy.timeout, Duration::from_millis(2_500));
    assert_eq!(policy.max_attempts, 4);
    assert_eq!(policy.initial_backoff, Duration::from_millis(500));
}
