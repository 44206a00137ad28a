use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::AppConfig;
use crate::relay::RoomRelay;
use crate::session::GameSession;
use crate::suggest::MoveSuggester;

/// One session behind its own lock.
pub type SessionHandle = Arc<Mutex<GameSession>>;

struct SessionEntry {
    handle: SessionHandle,
    /// Relay room for peer sessions.
    room: Option<String>,
}

/// Sessions stored by UUID. The map lock is only held long enough to clone
/// a handle; all game work happens under the per-session mutex.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub async fn insert(&self, session: GameSession) -> SessionHandle {
        let id = session.id.clone();
        let room = session.opponent().room().map(str::to_string);
        let handle = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                room,
            },
        );
        handle
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.inner.read().await.get(id).map(|e| e.handle.clone())
    }

    /// Drop a session; it also stops receiving relayed room moves.
    pub async fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.inner.write().await.remove(id).map(|e| e.handle)
    }

    /// Peer sessions attached to `room`, as (id, handle) pairs.
    pub async fn in_room(&self, room: &str) -> Vec<(String, SessionHandle)> {
        self.inner
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.room.as_deref() == Some(room))
            .map(|(id, e)| (id.clone(), e.handle.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub sessions: SessionStore,
    pub relay: Arc<RoomRelay>,
    pub suggester: Arc<dyn MoveSuggester>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, suggester: Arc<dyn MoveSuggester>) -> SharedState {
        Arc::new(AppState {
            sessions: SessionStore::default(),
            relay: RoomRelay::new(),
            suggester,
            config,
            start_time: std::time::Instant::now(),
        })
    }
}
