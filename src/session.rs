//! Turn-taking around one [`GameState`].
//!
//! A `GameSession` is owned by exactly one caller at a time (the API keeps
//! each one behind its own mutex). It turns presentation events into engine
//! calls, drives the external opponent through a [`MoveSuggester`] with a
//! bounded retry policy, and accepts peer moves arriving from the relay.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::engine::game::{self, GameState};
use crate::engine::types::{ChessError, Color, GameStatus, Square};
use crate::suggest::{MoveSuggester, SuggestRequest};

// =========================================================================
// Configuration types
// =========================================================================

/// Who plays the other side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Opponent {
    /// Both sides are moved through `attempt_move`.
    Local,
    /// `color` is played by a move suggester.
    External { color: Color },
    /// `color` is played by a remote peer in `room`.
    Peer { color: Color, room: String },
}

impl Opponent {
    /// The colour not under local control, if any.
    pub fn color(&self) -> Option<Color> {
        match self {
            Opponent::Local => None,
            Opponent::External { color } | Opponent::Peer { color, .. } => Some(*color),
        }
    }

    pub fn room(&self) -> Option<&str> {
        match self {
            Opponent::Peer { room, .. } => Some(room),
            _ => None,
        }
    }
}

/// How often, and how patiently, the external opponent is asked for a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between failed attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            backoff: Duration::ZERO,
        }
    }
}

// =========================================================================
// Results
// =========================================================================

/// Answer to a local or peer move attempt. Illegal moves are not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub accepted: bool,
    /// Recorded token when accepted.
    pub token: Option<String>,
    /// Why the move was refused.
    pub reason: Option<String>,
    pub status: GameStatus,
}

/// Result of one external turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalTurn {
    Played { token: String, attempts: u32 },
    /// Every attempt failed; the opponent lost by forfeit.
    Forfeited { attempts: u32 },
}

/// Current selection and the squares it can move to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub selected: Option<Square>,
    pub targets: Vec<Square>,
}

/// Errors that escape a session. Only a broken board is fatal.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Invariant(#[from] ChessError),

    #[error("it is not the external opponent's turn")]
    NotExternalTurn,

    #[error("this session has no peer opponent")]
    NotPeerSession,
}

// =========================================================================
// Snapshot
// =========================================================================

/// Read-only view handed to the presentation layer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub fen: String,
    pub board: [[String; 8]; 8],
    pub side_to_move: Color,
    pub status: String,
    pub outcome: String,
    pub is_check: bool,
    pub is_game_over: bool,
    pub winner: Option<Color>,
    pub history: Vec<String>,
    pub selection: Selection,
    pub opponent: Opponent,
    pub elo: u32,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// GameSession
// =========================================================================

#[derive(Debug)]
pub struct GameSession {
    pub id: String,
    game: GameState,
    opponent: Opponent,
    retry: RetryPolicy,
    elo: u32,
    selected: Option<Square>,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new(opponent: Opponent, retry: RetryPolicy, elo: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            game: GameState::new(),
            opponent,
            retry,
            elo,
            selected: None,
            created_at: Utc::now(),
        }
    }

    /// Start from a custom position instead of the standard one.
    pub fn with_game(mut self, game: GameState) -> Self {
        self.game = game;
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn elo(&self) -> u32 {
        self.elo
    }

    /// Whether the side to move is under local control.
    pub fn is_local_turn(&self) -> bool {
        self.opponent.color() != Some(self.game.side_to_move())
    }

    /// The external opponent is due to move.
    pub fn needs_external_move(&self) -> bool {
        matches!(self.opponent, Opponent::External { color } if color == self.game.side_to_move())
            && !self.game.is_game_over()
    }

    pub fn selection(&self) -> Selection {
        match self.selected {
            Some(sq) => Selection {
                selected: Some(sq),
                targets: self.game.legal_moves_from(sq),
            },
            None => Selection::default(),
        }
    }

    // -----------------------------------------------------------------
    // Presentation events
    // -----------------------------------------------------------------

    /// Select `sq` if it holds a piece the local player may move;
    /// selecting it again, or anything else, clears the selection.
    pub fn select_square(&mut self, sq: Square) -> Selection {
        let movable = self.is_local_turn()
            && !self.game.is_game_over()
            && self
                .game
                .board()
                .piece_at(sq)
                .is_some_and(|p| p.color == self.game.side_to_move());

        self.selected = if movable && self.selected != Some(sq) {
            Some(sq)
        } else {
            None
        };
        self.selection()
    }

    /// Try a local move. Refusals come back as a rejected outcome.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, SessionError> {
        self.selected = None;
        if !self.is_local_turn() {
            return Ok(self.rejected("not your turn".to_string()));
        }
        match self.game.attempt_move(from, to) {
            Ok(token) => {
                debug!(session_id = %self.id, %token, "local move");
                Ok(self.accepted(token))
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => Ok(self.rejected(e.to_string())),
        }
    }

    /// Apply a token received from the peer transport.
    pub fn receive_peer_move(&mut self, token: &str) -> Result<MoveOutcome, SessionError> {
        let Opponent::Peer { color, .. } = self.opponent else {
            return Err(SessionError::NotPeerSession);
        };
        if self.game.side_to_move() != color {
            return Ok(self.rejected("not the peer's turn".to_string()));
        }
        match self.game.apply_token(token) {
            Ok(token) => {
                self.selected = None;
                debug!(session_id = %self.id, %token, "peer move");
                Ok(self.accepted(token))
            }
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!(session_id = %self.id, token, "peer move rejected: {e}");
                Ok(self.rejected(e.to_string()))
            }
        }
    }

    /// Reinitialise to the standard starting position.
    pub fn reset(&mut self) {
        self.game = GameState::new();
        self.selected = None;
        info!(session_id = %self.id, "session reset");
    }

    // -----------------------------------------------------------------
    // External opponent
    // -----------------------------------------------------------------

    pub fn suggest_request(&self) -> SuggestRequest {
        SuggestRequest::from_game(&self.game, self.elo)
    }

    /// Ask `suggester` for the opponent's move until one decodes to a legal
    /// move or the retry policy runs out. Exhaustion forfeits the game.
    pub async fn play_external_turn(
        &mut self,
        suggester: &dyn MoveSuggester,
    ) -> Result<ExternalTurn, SessionError> {
        let Opponent::External { color } = self.opponent else {
            return Err(SessionError::NotExternalTurn);
        };
        if !self.needs_external_move() {
            return Err(SessionError::NotExternalTurn);
        }

        let request = self.suggest_request();
        let max = self.retry.max_attempts.max(1);

        for attempt in 1..=max {
            match suggester.suggest(&request).await {
                Ok(raw) => match self.game.apply_token(&raw) {
                    Ok(token) => {
                        info!(
                            session_id = %self.id,
                            suggester = suggester.name(),
                            attempt,
                            %token,
                            "external move played"
                        );
                        return Ok(ExternalTurn::Played {
                            token,
                            attempts: attempt,
                        });
                    }
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => warn!(
                        session_id = %self.id,
                        attempt,
                        raw = %raw,
                        "suggested move rejected: {e}"
                    ),
                },
                Err(e) => warn!(
                    session_id = %self.id,
                    suggester = suggester.name(),
                    attempt,
                    "suggester failed: {e}"
                ),
            }

            if attempt < max && !self.retry.backoff.is_zero() {
                tokio::time::sleep(self.retry.backoff).await;
            }
        }

        self.game.forfeit(color);
        warn!(session_id = %self.id, attempts = max, "external opponent forfeits");
        Ok(ExternalTurn::Forfeited { attempts: max })
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.game.status();
        SessionSnapshot {
            id: self.id.clone(),
            fen: self.game.to_fen(),
            board: self.game.board_array(),
            side_to_move: self.game.side_to_move(),
            status: status.as_str().to_string(),
            outcome: status.outcome_text().to_string(),
            is_check: status.is_check(),
            is_game_over: status.is_game_over(),
            winner: status.winner(),
            history: self.game.tokens(),
            selection: self.selection(),
            opponent: self.opponent.clone(),
            elo: self.elo,
            created_at: self.created_at,
        }
    }

    /// Board after `ply` half-moves, as a piece-code array.
    pub fn replay(&self, ply: usize) -> Option<[[String; 8]; 8]> {
        self.game.board_at(ply).map(game::board_array)
    }

    fn accepted(&self, token: String) -> MoveOutcome {
        MoveOutcome {
            accepted: true,
            token: Some(token),
            reason: None,
            status: self.game.status(),
        }
    }

    fn rejected(&self, reason: String) -> MoveOutcome {
        MoveOutcome {
            accepted: false,
            token: None,
            reason: Some(reason),
            status: self.game.status(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
