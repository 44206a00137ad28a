use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::engine::game::GameState;
use crate::engine::types::{ChessError, Square};
use crate::relay::{RelayMessage, relay_move};
use crate::session::{GameSession, RetryPolicy, Selection, SessionSnapshot};

use super::errors::ApiError;
use super::models::*;
use super::state::{SessionHandle, SharedState};

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        suggester: state.suggester.name().to_string(),
        sessions: state.sessions.len().await,
        relay_connections: state.relay.total_connections().await,
        uptime,
    })
}

// =========================================================================
// Create / Get Session
// =========================================================================

/// POST /api/sessions
pub async fn create_session(
    State(state): State<SharedState>,
    Json(input): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let opponent = input.opponent().map_err(ApiError::InvalidRequest)?;
    let elo = input.elo.unwrap_or(state.config.default_elo);
    let mut session = GameSession::new(opponent, RetryPolicy::from_config(&state.config), elo);
    if let Some(ref fen) = input.fen {
        session = session.with_game(GameState::from_fen(fen)?);
    }

    let handle = state.sessions.insert(session).await;
    let mut session = handle.lock().await;

    // An external opponent playing white opens the game.
    if session.needs_external_move() {
        session.play_external_turn(state.suggester.as_ref()).await?;
    }

    tracing::info!(session_id = %session.id, opponent = ?session.opponent(), "session created");
    Ok((StatusCode::CREATED, Json(session.snapshot())))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, &id).await?;
    let session = handle.lock().await;
    Ok(Json(session.snapshot()))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .sessions
        .remove(&id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    tracing::info!(session_id = %id, "session deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Session deleted".to_string(),
    }))
}

// =========================================================================
// Select
// =========================================================================

/// POST /api/sessions/:id/select
pub async fn select(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<SelectRequest>,
) -> Result<Json<Selection>, ApiError> {
    let sq = parse_square(&input.square)?;
    let handle = session_handle(&state, &id).await?;
    let mut session = handle.lock().await;
    Ok(Json(session.select_square(sq)))
}

// =========================================================================
// Moves
// =========================================================================

/// POST /api/sessions/:id/moves
///
/// Plays the local move and, when the external opponent is due, its reply.
/// Accepted moves in peer sessions are relayed to the room.
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let from = parse_square(&input.from)?;
    let to = parse_square(&input.to)?;
    let handle = session_handle(&state, &id).await?;
    let mut session = handle.lock().await;

    let outcome = session.attempt_move(from, to)?;

    let mut external = None;
    if outcome.accepted && session.needs_external_move() {
        let turn = session.play_external_turn(state.suggester.as_ref()).await?;
        external = Some(ExternalTurnResponse::new(state.suggester.name(), turn));
    }

    let relay = match (outcome.accepted, session.opponent().room(), &outcome.token) {
        (true, Some(room), Some(token)) => Some(RelayMessage {
            room_id: room.to_string(),
            move_san: token.clone(),
            source_player_id: id.clone(),
        }),
        _ => None,
    };

    let response = MoveResponse::new(outcome, external, session.snapshot());
    drop(session); // other sessions in the room are locked by the relay

    if let Some(msg) = relay {
        relay_move(&state, msg, Some(&id), None).await;
    }

    Ok(Json(response))
}

/// POST /api/sessions/:id/external-move
///
/// Ask the external opponent again, e.g. after changing suggester.
pub async fn external_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MoveResponse>, ApiError> {
    let handle = session_handle(&state, &id).await?;
    let mut session = handle.lock().await;

    let turn = session.play_external_turn(state.suggester.as_ref()).await?;
    let external = ExternalTurnResponse::new(state.suggester.name(), turn);
    let snapshot = session.snapshot();

    Ok(Json(MoveResponse {
        accepted: !external.forfeited,
        token: external.token.clone(),
        reason: external
            .forfeited
            .then(|| "external opponent forfeited".to_string()),
        external: Some(external),
        session: snapshot,
    }))
}

/// POST /api/sessions/:id/peer-move
pub async fn peer_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<PeerMoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let handle = session_handle(&state, &id).await?;
    let mut session = handle.lock().await;
    let outcome = session.receive_peer_move(&input.move_san)?;
    Ok(Json(MoveResponse::new(outcome, None, session.snapshot())))
}

// =========================================================================
// Reset / Replay
// =========================================================================

/// POST /api/sessions/:id/reset
pub async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = session_handle(&state, &id).await?;
    let mut session = handle.lock().await;
    session.reset();
    if session.needs_external_move() {
        session.play_external_turn(state.suggester.as_ref()).await?;
    }
    Ok(Json(session.snapshot()))
}

/// GET /api/sessions/:id/replay/:ply
pub async fn replay(
    State(state): State<SharedState>,
    Path((id, ply)): Path<(String, usize)>,
) -> Result<Json<ReplayResponse>, ApiError> {
    let handle = session_handle(&state, &id).await?;
    let session = handle.lock().await;
    let total_plies = session.game().ply();
    let board = session.replay(ply).ok_or_else(|| {
        ApiError::InvalidRequest(format!("ply {ply} is outside 0..={total_plies}"))
    })?;
    let last_token = ply
        .checked_sub(1)
        .and_then(|i| session.game().history().get(i))
        .map(|rec| rec.token.clone());

    Ok(Json(ReplayResponse {
        ply,
        total_plies,
        board,
        last_token,
    }))
}

// =========================================================================
// Helpers
// =========================================================================

async fn session_handle(state: &SharedState, id: &str) -> Result<SessionHandle, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

fn parse_square(s: &str) -> Result<Square, ApiError> {
    Square::from_algebraic(s.trim())
        .ok_or_else(|| ChessError::InvalidSquare(s.to_string()).into())
}

// =========================================================================
// Tests
// =========================================================================
