//! LLM-backed judgment service.
//!
//! Asks the model whether a word is a real, playable noun (chain mode) or
//! whether it is associated with the previous word (association mode).
//! The reply is expected as two lines:
//!
//! ```text
//! VERDICT: OK
//! REASON: a common fruit
//! ```

use crate::gateway::{Judgment, JudgmentRequest, JudgmentService, ServiceError};
use crate::games::shiritori::GameMode;
use crate::llm_client::{LlmClient, LlmError};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

const CHAIN_PROMPT: &str = "You are the referee of a game of shiritori. \
Decide whether the given word is a real, commonly used noun in its language. \
Proper nouns, made-up words and phrases are not allowed. \
Reply with exactly two lines:\nVERDICT: OK or VERDICT: NG\nREASON: one short sentence";

const ASSOCIATION_PROMPT: &str = "You are the referee of a game of association shiritori. \
Decide whether the new word is a real noun that a reasonable person would associate \
with the previous word. \
Reply with exactly two lines:\nVERDICT: OK or VERDICT: NG\nREASON: one short sentence";

/// Judgment service backed by a chat-completion model.
#[derive(Debug, Clone)]
pub struct LlmJudge {
    client: LlmClient,
}

impl LlmJudge {
    /// Creates a judge over the given client.
    #[instrument(skip(client))]
    pub fn new(client: LlmClient) -> Self {
        info!(provider = ?client.config().provider(), "Creating LLM judge");
        Self { client }
    }

    fn prompts(request: &JudgmentRequest) -> (&'static str, String) {
        match (request.mode, &request.previous) {
            (GameMode::Association, Some(previous)) => (
                ASSOCIATION_PROMPT,
                format!("Previous word: {}\nNew word: {}", previous, request.word),
            ),
            (_, Some(previous)) => (
                CHAIN_PROMPT,
                format!("Previous word: {}\nWord: {}", previous, request.word),
            ),
            (_, None) => (CHAIN_PROMPT, format!("Word: {}", request.word)),
        }
    }
}

#[async_trait]
impl JudgmentService for LlmJudge {
    #[instrument(skip(self), fields(word = %request.word, mode = %request.mode))]
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, ServiceError> {
        let (system, user) = Self::prompts(request);
        let reply = self
            .client
            .generate(system, &user)
            .await
            .map_err(service_error)?;
        debug!(reply = %reply, "Model replied");
        Ok(parse_judgment(&reply))
    }
}

fn service_error(e: LlmError) -> ServiceError {
    if e.transient {
        ServiceError::transient(e.message)
    } else {
        ServiceError::permanent(e.message)
    }
}

/// Reads a `VERDICT:` / `REASON:` reply. Anything unreadable is a rejection.
#[instrument(skip(text))]
pub fn parse_judgment(text: &str) -> Judgment {
    let mut verdict = None;
    let mut reason = None;

    for line in text.lines().map(str::trim) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "VERDICT" if verdict.is_none() => {
                verdict = match value.to_ascii_uppercase().as_str() {
                    "OK" => Some(true),
                    "NG" => Some(false),
                    _ => None,
                };
            }
            "REASON" if reason.is_none() => reason = Some(value.to_string()),
            _ => {}
        }
    }

    match verdict {
        Some(true) => Judgment::Approved {
            reason: reason.unwrap_or_default(),
        },
        Some(false) => Judgment::Rejected {
            reason: reason.unwrap_or_else(|| "no reason given".to_string()),
        },
        None => {
            warn!(reply = %text, "Unreadable judgment reply");
            Judgment::Rejected {
                reason: "the referee's reply could not be read".to_string(),
            }
        }
    }
}
