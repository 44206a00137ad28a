use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;
use crate::relay;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check (outside /api prefix)
        .route("/health", get(handlers::health))
        // Sessions
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/select", post(handlers::select))
        .route("/api/sessions/{id}/moves", post(handlers::make_move))
        .route("/api/sessions/{id}/external-move", post(handlers::external_move))
        .route("/api/sessions/{id}/peer-move", post(handlers::peer_move))
        .route("/api/sessions/{id}/reset", post(handlers::reset))
        .route("/api/sessions/{id}/replay/{ply}", get(handlers::replay))
        // Peer relay
        .route("/ws/rooms/{room}", get(relay::relay_handler))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
