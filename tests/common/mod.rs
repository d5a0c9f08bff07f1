//! Shared test fixtures: a scripted judgment service.

#![allow(dead_code)]

use async_trait::async_trait;
use shiritori::{
    EngineConfig, Judgment, JudgmentRequest, JudgmentService, Player, ServiceError,
    ShiritoriEngine,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Approve,
    Reject(&'static str),
    Transient,
    Permanent,
    /// Never answers.
    Hang,
}

/// Judgment service answering from a script, approving once it runs out.
#[derive(Debug, Default)]
pub struct ScriptedReferee {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<JudgmentRequest>>,
}

impl ScriptedReferee {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn approving() -> Arc<Self> {
        Self::new([])
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<JudgmentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JudgmentService for ScriptedReferee {
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Approve);
        match reply {
            Reply::Approve => Ok(Judgment::Approved {
                reason: "fine".to_string(),
            }),
            Reply::Reject(reason) => Ok(Judgment::Rejected {
                reason: reason.to_string(),
            }),
            Reply::Transient => Err(ServiceError::transient("connection reset")),
            Reply::Permanent => Err(ServiceError::permanent("bad request")),
            Reply::Hang => std::future::pending::<Result<Judgment, ServiceError>>().await,
        }
    }
}

/// Kana play without seed judgment.
pub fn kana_config() -> EngineConfig {
    EngineConfig::default().with_judge_seed_word(false)
}

/// Engine over `referee` with alice and bob (host alice) already joined.
pub async fn two_player_engine(
    config: EngineConfig,
    referee: Arc<ScriptedReferee>,
    channel: &str,
) -> ShiritoriEngine {
    let engine = ShiritoriEngine::new(config, referee);
    engine
        .handle_join(channel, Player::new("alice", "Alice"))
        .await
        .unwrap();
    engine
        .handle_join(channel, Player::new("bob", "Bob"))
        .await
        .unwrap();
    engine
}
