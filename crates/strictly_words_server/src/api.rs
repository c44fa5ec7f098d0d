//! HTTP and WebSocket adapter over [`GameService`].
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Liveness and dictionary readiness |
//! | GET | `/words/{word}` | Dictionary lookup |
//! | POST | `/games` | Create a game |
//! | GET | `/games/{id}` | Current view |
//! | DELETE | `/games/{id}` | Tear down |
//! | POST | `/games/{id}/join` | Mark a player connected |
//! | POST | `/games/{id}/play` | Play tiles or a proposed board |
//! | POST | `/games/{id}/exchange` | Exchange one tile |
//! | POST | `/games/{id}/pass` | Pass |
//! | POST | `/games/{id}/timeout` | Time out the current turn |
//! | POST | `/games/{id}/stage` | Stage tiles |
//! | POST | `/games/{id}/recall` | Recall staged tiles |
//! | POST | `/games/{id}/shuffle` | Shuffle a rack |
//! | POST | `/games/{id}/rack` | Reorder a rack |
//! | POST | `/games/{id}/preview` | Predict a score |
//! | GET | `/games/{id}/events` | WebSocket event stream |

use crate::events::{GameEvent, GameView};
use crate::service::{GameService, PlayReport};
use crate::session::SessionError;
use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use strictly_words::{Board, DictionaryError, MoveScore, Placement, Tile, TurnError};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Builds the router for `service`.
pub fn router(service: GameService) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/words/{word}", get(handle_check_word))
        .route("/games", post(handle_create_game))
        .route("/games/{id}", get(handle_get_game).delete(handle_remove_game))
        .route("/games/{id}/join", post(handle_join))
        .route("/games/{id}/play", post(handle_play))
        .route("/games/{id}/exchange", post(handle_exchange))
        .route("/games/{id}/pass", post(handle_pass))
        .route("/games/{id}/timeout", post(handle_timeout))
        .route("/games/{id}/stage", post(handle_stage))
        .route("/games/{id}/recall", post(handle_recall))
        .route("/games/{id}/shuffle", post(handle_shuffle))
        .route("/games/{id}/rack", post(handle_reorder))
        .route("/games/{id}/preview", post(handle_preview))
        .route("/games/{id}/events", get(handle_events))
        .with_state(service)
}

// ── Request/Response types ──────────────────────────────────────────

/// Body of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// First seat.
    pub player_a: String,
    /// Second seat.
    pub player_b: String,
}

/// Response of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    /// New game id.
    pub game_id: String,
    /// Initial view.
    pub game: GameView,
}

/// Body naming the acting player.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRequest {
    /// Acting player.
    pub player_id: String,
}

/// Body of play, stage and preview: either explicit tiles or a proposed
/// board.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesRequest {
    /// Acting player.
    pub player_id: String,
    /// Tiles to place.
    #[serde(default)]
    pub tiles: Option<Vec<Placement>>,
    /// Full proposed board. Only honoured by play.
    #[serde(default)]
    pub board: Option<Board>,
}

/// Body of `POST /games/{id}/exchange`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    /// Acting player.
    pub player_id: String,
    /// Tile to give back.
    pub tile: Tile,
}

/// Body of `POST /games/{id}/rack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    /// Acting player.
    pub player_id: String,
    /// New order, a permutation of the rack.
    pub order: Vec<Tile>,
}

/// Response of `GET /words/{word}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCheckResponse {
    /// The word looked up.
    pub word: String,
    /// Whether it is in the dictionary.
    pub is_valid: bool,
}

// ── Errors ──────────────────────────────────────────────────────────

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
    /// Stable reason code.
    pub code: String,
    /// True if the same request may succeed later.
    pub retryable: bool,
    /// Offending word for dictionary rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

/// Anything a handler can fail with.
#[derive(Debug, derive_more::Display)]
pub enum ApiError {
    /// Store or turn failure.
    #[display("{}", _0)]
    Session(SessionError),
    /// Dictionary could not answer.
    #[display("{}", _0)]
    Dictionary(DictionaryError),
    /// The request body was unusable.
    #[display("{}", _0)]
    BadRequest(String),
}

impl std::error::Error for ApiError {}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<DictionaryError> for ApiError {
    fn from(err: DictionaryError) -> Self {
        ApiError::Dictionary(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Dictionary(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Session(err) => match err {
                SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                SessionError::Conflict(_) => StatusCode::CONFLICT,
                SessionError::DuplicatePlayers(_) | SessionError::EmptyPlayerId => StatusCode::BAD_REQUEST,
                SessionError::Turn(turn) => match turn {
                    TurnError::Shape(_) | TurnError::NotAPermutation => StatusCode::BAD_REQUEST,
                    TurnError::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    TurnError::ValidationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    TurnError::UnknownPlayer(_) => StatusCode::FORBIDDEN,
                    TurnError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    TurnError::BagEmpty | TurnError::NotYourTurn(_) | TurnError::NotStarted | TurnError::GameOver => {
                        StatusCode::CONFLICT
                    }
                },
            },
        }
    }

    fn body(&self) -> ErrorBody {
        let (code, retryable, word) = match self {
            ApiError::BadRequest(_) => ("bad_request", false, None),
            ApiError::Dictionary(_) => ("validation_unavailable", true, None),
            ApiError::Session(err) => {
                let code = match err {
                    SessionError::NotFound(_) => "not_found",
                    SessionError::Conflict(_) => "conflict",
                    SessionError::DuplicatePlayers(_) => "duplicate_players",
                    SessionError::EmptyPlayerId => "empty_player_id",
                    SessionError::Turn(turn) => turn.code(),
                };
                let word = match err {
                    SessionError::Turn(TurnError::Rule(strictly_words::PlacementError::InvalidWord(word))) => {
                        Some(word.clone())
                    }
                    _ => None,
                };
                (code, err.is_retryable(), word)
            }
        };
        ErrorBody {
            error: self.to_string(),
            code: code.to_string(),
            retryable,
            word,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, error = %self, "Request failed");
        } else {
            debug!(%status, error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_health(State(service): State<GameService>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "dictionaryReady": service.dictionary_ready(),
        "games": service.game_ids().len(),
    }))
}

#[instrument(skip(service))]
async fn handle_check_word(
    State(service): State<GameService>,
    Path(word): Path<String>,
) -> ApiResult<WordCheckResponse> {
    let is_valid = service.check_word(&word).await?;
    Ok(Json(WordCheckResponse { word, is_valid }))
}

async fn handle_get_game(State(service): State<GameService>, Path(id): Path<String>) -> ApiResult<GameView> {
    Ok(Json(service.get_game(&id)?))
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[instrument(skip(service, request), fields(player_a = %request.player_a, player_b = %request.player_b))]
async fn handle_create_game(
    State(service): State<GameService>,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let game = service.create_game(&request.player_a, &request.player_b)?;
    info!(game_id = %game.snapshot.game_id, "Game created over HTTP");
    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse {
            game_id: game.snapshot.game_id.clone(),
            game,
        }),
    ))
}

async fn handle_remove_game(State(service): State<GameService>, Path(id): Path<String>) -> ApiResult<GameView> {
    Ok(Json(service.remove_game(&id).await?))
}

async fn handle_join(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.join(&id, &request.player_id)?))
}

// ── Turn operations ─────────────────────────────────────────────────

#[instrument(skip(service, request), fields(player = %request.player_id))]
async fn handle_play(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<TilesRequest>,
) -> ApiResult<PlayReport> {
    let report = match (request.tiles, request.board) {
        (Some(tiles), None) => service.apply_play(&id, &request.player_id, &tiles).await?,
        (None, Some(board)) => service.apply_play_proposed(&id, &request.player_id, &board).await?,
        _ => return Err(ApiError::BadRequest("Provide exactly one of 'tiles' or 'board'".to_string())),
    };
    Ok(Json(report))
}

async fn handle_exchange(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<ExchangeRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.apply_exchange(&id, &request.player_id, request.tile)?))
}

async fn handle_pass(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.apply_pass(&id, &request.player_id)?))
}

async fn handle_timeout(State(service): State<GameService>, Path(id): Path<String>) -> ApiResult<GameView> {
    Ok(Json(service.apply_timeout(&id)?))
}

fn required_tiles(tiles: Option<Vec<Placement>>) -> Result<Vec<Placement>, ApiError> {
    tiles.ok_or_else(|| ApiError::BadRequest("Missing 'tiles'".to_string()))
}

async fn handle_stage(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<TilesRequest>,
) -> ApiResult<GameView> {
    let tiles = required_tiles(request.tiles)?;
    Ok(Json(service.stage(&id, &request.player_id, &tiles)?))
}

async fn handle_recall(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.recall(&id, &request.player_id)?))
}

async fn handle_shuffle(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.shuffle_rack(&id, &request.player_id)?))
}

async fn handle_reorder(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<GameView> {
    Ok(Json(service.reorder_rack(&id, &request.player_id, request.order)?))
}

async fn handle_preview(
    State(service): State<GameService>,
    Path(id): Path<String>,
    Json(request): Json<TilesRequest>,
) -> ApiResult<MoveScore> {
    let tiles = required_tiles(request.tiles)?;
    Ok(Json(service.preview(&id, &request.player_id, &tiles)?))
}

// ── Events ──────────────────────────────────────────────────────────

async fn handle_events(
    ws: WebSocketUpgrade,
    State(service): State<GameService>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let receiver = service.subscribe(&id)?;
    let view = service.get_game(&id)?;
    info!(game_id = %id, "Event stream opened");
    Ok(ws.on_upgrade(move |socket| stream_events(socket, service, view, receiver)))
}

async fn send_event(socket: &mut WebSocket, event: &GameEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            true
        }
    }
}

#[instrument(skip_all, fields(game_id = %initial.snapshot.game_id))]
async fn stream_events(
    mut socket: WebSocket,
    service: GameService,
    initial: GameView,
    mut events: broadcast::Receiver<GameEvent>,
) {
    let id = initial.snapshot.game_id.clone();
    let first = GameEvent::GameUpdated {
        view: Box::new(initial),
        score: None,
    };
    if !send_event(&mut socket, &first).await {
        return;
    }

    loop {
        tokio::select! {
            event = service.next_event(&id, &mut events) => match event {
                Some(event) => {
                    let removed = event == GameEvent::GameRemoved;
                    if !send_event(&mut socket, &event).await || removed {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("Event stream closed");
}
