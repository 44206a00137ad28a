//! Room membership for the peer relay: tracks connected clients per room
//! and fans events out to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::RelayEvent;

/// Sending half kept by the relay; the socket task owns the receiver.
pub type ClientSender = mpsc::UnboundedSender<RelayEvent>;

/// A unique ID assigned to each connected client.
pub type ClientId = u64;

/// Per-room client sets with broadcast.
#[derive(Debug)]
pub struct RoomRelay {
    /// room_id → { client_id → sender }
    rooms: RwLock<HashMap<String, HashMap<ClientId, ClientSender>>>,
    next_id: AtomicU64,
}

impl RoomRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a client in `room`, returning (client_id, receiver).
    pub async fn subscribe(&self, room: &str) -> (ClientId, mpsc::UnboundedReceiver<RelayEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut rooms = self.rooms.write().await;
        rooms.entry(room.to_string()).or_default().insert(id, tx);

        debug!(room, client_id = id, "relay client joined");
        (id, rx)
    }

    /// Remove a client from `room`; empty rooms are dropped.
    pub async fn unsubscribe(&self, room: &str, client_id: ClientId) {
        let mut rooms = self.rooms.write().await;
        if let Some(clients) = rooms.get_mut(room) {
            clients.remove(&client_id);
            if clients.is_empty() {
                rooms.remove(room);
            }
        }
        debug!(room, client_id, "relay client left");
    }

    /// Send `event` to everyone in `room` except `skip`. Returns how many
    /// clients it reached.
    pub async fn publish(&self, room: &str, event: RelayEvent, skip: Option<ClientId>) -> usize {
        let rooms = self.rooms.read().await;
        let Some(clients) = rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        let mut stale: Vec<ClientId> = Vec::new();
        for (&cid, tx) in clients {
            if Some(cid) == skip {
                continue;
            }
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                stale.push(cid);
            }
        }
        drop(rooms);

        if !stale.is_empty() {
            let mut rooms = self.rooms.write().await;
            if let Some(clients) = rooms.get_mut(room) {
                for cid in &stale {
                    clients.remove(cid);
                    warn!(room, client_id = cid, "removed stale relay client");
                }
                if clients.is_empty() {
                    rooms.remove(room);
                }
            }
        }
        delivered
    }

    /// Send `event` to a single client.
    pub async fn send_to(&self, room: &str, client_id: ClientId, event: RelayEvent) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(room)
            .and_then(|clients| clients.get(&client_id))
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    pub async fn subscriber_count(&self, room: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room).map_or(0, |c| c.len())
    }

    pub async fn total_connections(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().map(|c| c.len()).sum()
    }

    pub async fn active_rooms(&self) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms.keys().cloned().collect()
    }
}

impl Default for RoomRelay {
    fn default() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::messages::RelayMessage;

    fn mv(room: &str, san: &str) -> RelayEvent {
        RelayEvent::Move(RelayMessage {
            room_id: room.into(),
            move_san: san.into(),
            source_player_id: "p".into(),
        })
    }

    #[tokio::test]
    async fn subscribe_returns_unique_ids() {
        let relay = RoomRelay::new();
        let (id1, _rx1) = relay.subscribe("r1").await;
        let (id2, _rx2) = relay.subscribe("r1").await;
        assert_ne!(id1, id2);
    }

    #[tokio::test]
    async fn subscriber_count_tracks_joins_and_leaves() {
        let relay = RoomRelay::new();
        assert_eq!(relay.subscriber_count("r1").await, 0);
        let (id1, _rx1) = relay.subscribe("r1").await;
        let (_id2, _rx2) = relay.subscribe("r1").await;
        assert_eq!(relay.subscriber_count("r1").await, 2);
        relay.unsubscribe("r1", id1).await;
        assert_eq!(relay.subscriber_count("r1").await, 1);
    }

    #[tokio::test]
    async fn empty_rooms_are_dropped() {
        let relay = RoomRelay::new();
        let (id1, _rx1) = relay.subscribe("r1").await;
        relay.unsubscribe("r1", id1).await;
        assert!(relay.active_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn publish_skips_the_sender() {
        let relay = RoomRelay::new();
        let (id1, mut rx1) = relay.subscribe("r1").await;
        let (_id2, mut rx2) = relay.subscribe("r1").await;

        assert_eq!(relay.publish("r1", mv("r1", "e4"), Some(id1)).await, 1);
        assert_eq!(rx2.recv().await, Some(mv("r1", "e4")));
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_does_not_cross_rooms() {
        let relay = RoomRelay::new();
        let (_id1, mut rx1) = relay.subscribe("r1").await;
        let (_id2, mut rx2) = relay.subscribe("r2").await;

        relay.publish("r1", mv("r1", "e4"), None).await;
        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_removes_stale_clients() {
        let relay = RoomRelay::new();
        let (_id1, rx1) = relay.subscribe("r1").await;
        let (_id2, _rx2) = relay.subscribe("r1").await;
        drop(rx1);

        assert_eq!(relay.publish("r1", mv("r1", "d4"), None).await, 1);
        assert_eq!(relay.subscriber_count("r1").await, 1);
    }

    #[tokio::test]
    async fn send_to_reaches_one_client() {
        let relay = RoomRelay::new();
        let (id1, mut rx1) = relay.subscribe("r1").await;
        let (_id2, mut rx2) = relay.subscribe("r1").await;
        assert!(relay.send_to("r1", id1, RelayEvent::error("nope")).await);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
        assert!(!relay.send_to("r1", 999, RelayEvent::error("nope")).await);
    }

    #[tokio::test]
    async fn total_connections_across_rooms() {
        let relay = RoomRelay::new();
        let (_a, _rxa) = relay.subscribe("r1").await;
        let (_b, _rxb) = relay.subscribe("r1").await;
        let (_c, _rxc) = relay.subscribe("r2").await;
        assert_eq!(relay.total_connections().await, 3);
    }

    #[tokio::test]
    async fn publish_to_unknown_room_is_noop() {
        let relay = RoomRelay::new();
        assert_eq!(relay.publish("nowhere", mv("nowhere", "e4"), None).await, 0);
    }
}
