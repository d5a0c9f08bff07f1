//! HTTP adapter: a JSON API over the engine handlers.

use crate::engine::ShiritoriEngine;
use crate::error::GameError;
use crate::games::shiritori::{
    ChannelId, JoinReceipt, Player, PlayerId, SessionSnapshot, StartReceipt, SubmissionOutcome,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{info, instrument, warn};

/// Body of `POST /channels/{channel}/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Platform identity.
    pub player_id: PlayerId,
    /// Display label (defaults to the id).
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body of `POST /channels/{channel}/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    /// Player asking to start.
    pub requester: PlayerId,
    /// First word of the chain.
    pub seed_word: String,
    /// Explicit turn order.
    #[serde(default)]
    pub order: Option<Vec<PlayerId>>,
}

/// Body of `POST /channels/{channel}/words`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRequest {
    /// Submitting player.
    pub player_id: PlayerId,
    /// The word.
    pub word: String,
}

/// Body of `POST /channels/{channel}/end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndRequest {
    /// Player asking to end.
    pub requester: PlayerId,
}

/// Response of `GET /channels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelList {
    /// Channels with a live game.
    pub channels: Vec<ChannelId>,
}

/// A [`GameError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(error: GameError) -> Self {
        Self(error)
    }
}

/// HTTP status for a game error.
pub fn status_for(error: &GameError) -> StatusCode {
    match error {
        GameError::InvalidFormat(_)
        | GameError::ChainBroken { .. }
        | GameError::AlreadyUsed(_)
        | GameError::TerminalSeed(_)
        | GameError::GatewayRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        GameError::NotYourTurn { .. }
        | GameError::RosterClosed
        | GameError::TooFewPlayers { .. }
        | GameError::AlreadyJoined
        | GameError::NotInProgress
        | GameError::SessionEnded => StatusCode::CONFLICT,
        GameError::NotHost => StatusCode::FORBIDDEN,
        GameError::NoActiveGame => StatusCode::NOT_FOUND,
        GameError::GatewayUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GameError::SessionAborted => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!(kind = self.0.kind(), error = %self.0, "Request failed");
        }
        let body = serde_json::json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Builds the API router.
#[instrument(skip(engine))]
pub fn router(engine: ShiritoriEngine) -> Router {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/{channel}", get(channel_status))
        .route("/channels/{channel}/join", post(join))
        .route("/channels/{channel}/start", post(start))
        .route("/channels/{channel}/words", post(submit_word))
        .route("/channels/{channel}/end", post(end))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(engine)
}

async fn list_channels(State(engine): State<ShiritoriEngine>) -> Json<ChannelList> {
    Json(ChannelList {
        channels: engine.live_channels().await,
    })
}

async fn channel_status(
    State(engine): State<ShiritoriEngine>,
    Path(channel): Path<ChannelId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(engine.get_status(&channel).await?))
}

async fn join(
    State(engine): State<ShiritoriEngine>,
    Path(channel): Path<ChannelId>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinReceipt>, ApiError> {
    let display_name = req.display_name.unwrap_or_else(|| req.player_id.clone());
    let player = Player::new(req.player_id, display_name);
    Ok(Json(engine.handle_join(&channel, player).await?))
}

async fn start(
    State(engine): State<ShiritoriEngine>,
    Path(channel): Path<ChannelId>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartReceipt>, ApiError> {
    let receipt = engine
        .handle_start(&channel, &req.seed_word, &req.requester, req.order)
        .await?;
    Ok(Json(receipt))
}

async fn submit_word(
    State(engine): State<ShiritoriEngine>,
    Path(channel): Path<ChannelId>,
    Json(req): Json<WordRequest>,
) -> Result<Json<SubmissionOutcome>, ApiError> {
    let outcome = engine
        .handle_submission(&channel, &req.player_id, &req.word)
        .await?;
    Ok(Json(outcome))
}

async fn end(
    State(engine): State<ShiritoriEngine>,
    Path(channel): Path<ChannelId>,
    Json(req): Json<EndRequest>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(engine.handle_end(&channel, &req.requester).await?))
}
