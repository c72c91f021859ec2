use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use roster_core::session::SessionContext;
use roster_core::store::RecordStore;
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Record store the session loads from and saves to.
    pub store: Arc<dyn RecordStore>,
    /// The single editing session. Handlers hold the lock for the whole
    /// request, including store round trips, so requests apply in order.
    pub session: Arc<Mutex<SessionContext>>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Size of the session cache as of the last reload. Readable without
    /// the session lock.
    pub cached_characters: Arc<AtomicUsize>,
}

impl AppState {
    /// Build state around `store` with an empty session.
    ///
    /// The cache starts empty; call [`AppState::reload_session`] (or hit
    /// `POST /api/v1/characters/reload`) to fill it.
    pub fn new(store: Arc<dyn RecordStore>, config: ServerConfig) -> Self {
        Self {
            store,
            session: Arc::new(Mutex::new(SessionContext::new())),
            config: Arc::new(config),
            cached_characters: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reload the session cache from the store and publish its size.
    pub async fn reload_session(&self) -> usize {
        let mut session = self.session.lock().await;
        session.reload(self.store.as_ref()).await;
        self.publish_count(&session)
    }

    /// Record the cache size of `session` for lock-free readers.
    pub fn publish_count(&self, session: &SessionContext) -> usize {
        let count = session.records().len();
        self.cached_characters.store(count, Ordering::Relaxed);
        count
    }

    pub fn cached_count(&self) -> usize {
        self.cached_characters.load(Ordering::Relaxed)
    }
}
