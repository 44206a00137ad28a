use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::ChessError;
use crate::session::SessionError;

/// Structured API error that serializes to JSON. Illegal moves are not in
/// here: they are answered with `accepted: false`.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(String),
    InvalidFen(ChessError),
    InvalidRequest(String),
    NotExternalTurn,
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session not found: {id}"),
            ),
            ApiError::InvalidFen(err) => (StatusCode::BAD_REQUEST, "INVALID_FEN", err.to_string()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::NotExternalTurn => (
                StatusCode::CONFLICT,
                "NOT_EXTERNAL_TURN",
                "The external opponent is not due to move".to_string(),
            ),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChessError> for ApiError {
    fn from(err: ChessError) -> Self {
        match &err {
            ChessError::InvalidFen(_) => ApiError::InvalidFen(err),
            ChessError::MissingKing(_) => ApiError::InternalError(err.to_string()),
            ChessError::IllegalMove { .. }
            | ChessError::UnrecognizedMove(_)
            | ChessError::InvalidSquare(_)
            | ChessError::GameOver(_) => ApiError::InvalidRequest(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invariant(e) => e.into(),
            SessionError::NotExternalTurn => ApiError::NotExternalTurn,
            e @ SessionError::NotPeerSession => ApiError::InvalidRequest(e.to_string()),
        }
    }
}
