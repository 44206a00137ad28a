//! WebSocket upgrade handler: joins a client to a relay room and forwards
//! the moves it sends to everyone else in that room.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::api::state::SharedState;

use super::manager::ClientId;
use super::messages::{RelayEvent, RelayMessage};

#[derive(Debug, Default, Deserialize)]
pub struct JoinQuery {
    pub player: Option<String>,
}

/// GET /ws/rooms/{room} — upgrade to WebSocket.
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    Query(query): Query<JoinQuery>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, room, query.player, state))
}

async fn handle_socket(socket: WebSocket, room: String, player: Option<String>, state: SharedState) {
    let (client_id, mut rx) = state.relay.subscribe(&room).await;
    let player_id = player.unwrap_or_else(|| format!("client-{client_id}"));
    let (mut sink, mut stream) = socket.split();

    let joined = RelayEvent::Joined {
        room_id: room.clone(),
        player_id: player_id.clone(),
        players: state.relay.subscriber_count(&room).await,
    };
    if sink
        .send(Message::Text(joined.to_json().into()))
        .await
        .is_err()
    {
        cleanup(&state, &room, client_id).await;
        return;
    }

    // Writer task: relay events → WS sink.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader task: client → room.
    let reader_state = state.clone();
    let reader_room = room.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(
                        &reader_state,
                        &reader_room,
                        client_id,
                        &player_id,
                        text.as_str(),
                    )
                    .await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, &room, client_id).await;
}

async fn handle_client_message(
    state: &SharedState,
    room: &str,
    client_id: ClientId,
    player_id: &str,
    text: &str,
) {
    let mut msg = match serde_json::from_str::<RelayMessage>(text) {
        Ok(m) => m,
        Err(e) => {
            debug!(room, client_id, "invalid relay message: {e}");
            let err = RelayEvent::error(format!("invalid message: {e}"));
            state.relay.send_to(room, client_id, err).await;
            return;
        }
    };

    if msg.room_id != room {
        let err = RelayEvent::error(format!(
            "message for room {} sent on room {room}",
            msg.room_id
        ));
        state.relay.send_to(room, client_id, err).await;
        return;
    }
    if msg.source_player_id.is_empty() {
        msg.source_player_id = player_id.to_string();
    }

    relay_move(state, msg, None, Some(client_id)).await;
}

/// Deliver a peer move: apply it to every peer session in the room except
/// `skip_session`, then push it to every relay client except `skip_client`.
/// Returns how many sessions accepted the move.
///
/// Callers must not hold the lock of a session in the same room unless
/// they pass its id as `skip_session`.
pub async fn relay_move(
    state: &SharedState,
    msg: RelayMessage,
    skip_session: Option<&str>,
    skip_client: Option<ClientId>,
) -> usize {
    let mut applied = 0;
    for (id, handle) in state.sessions.in_room(&msg.room_id).await {
        if Some(id.as_str()) == skip_session {
            continue;
        }
        let mut session = handle.lock().await;
        match session.receive_peer_move(&msg.move_san) {
            Ok(outcome) if outcome.accepted => applied += 1,
            Ok(outcome) => debug!(
                session_id = %id,
                token = %msg.move_san,
                reason = ?outcome.reason,
                "peer move not applied"
            ),
            Err(e) => warn!(session_id = %id, "peer move failed: {e}"),
        }
    }

    let delivered = state
        .relay
        .publish(&msg.room_id, RelayEvent::Move(msg.clone()), skip_client)
        .await;

    info!(
        room = %msg.room_id,
        token = %msg.move_san,
        source = %msg.source_player_id,
        applied,
        delivered,
        "peer move relayed"
    );
    applied
}

async fn cleanup(state: &SharedState, room: &str, client_id: ClientId) {
    state.relay.unsubscribe(room, client_id).await;
    debug!(room, client_id, "relay session cleaned up");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
