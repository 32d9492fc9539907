//! Concurrent registry of established sessions

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use wire_protocol::DeviceId;

use crate::Session;

/// Thread-safe map of peer device id to active session.
///
/// Not persisted: sessions live only as long as their connections. The
/// single mutex is held only for insert/remove/lookup; key zeroization
/// happens on the session's drop once the last `Arc` is gone, so `remove`
/// is idempotent and safe from concurrent teardown paths.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<DeviceId, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the session for a peer
    pub fn get(&self, peer_id: DeviceId) -> Option<Arc<Session>> {
        self.inner.lock().get(&peer_id).cloned()
    }

    /// Whether a session exists for a peer
    pub fn contains(&self, peer_id: DeviceId) -> bool {
        self.inner.lock().contains_key(&peer_id)
    }

    /// Insert a session, returning the displaced one if the peer already
    /// had a session (peer restart)
    pub fn put(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let peer_id = session.peer_device_id();
        let displaced = self.inner.lock().insert(peer_id, session);
        if displaced.is_some() {
            debug!(peer = %peer_id, "replaced existing session");
        }
        displaced
    }

    /// Remove a peer's session. Idempotent: later callers observe
    /// "already removed" and the keys are wiped exactly once, on drop.
    pub fn remove(&self, peer_id: DeviceId) -> Option<Arc<Session>> {
        let removed = self.inner.lock().remove(&peer_id);
        if removed.is_some() {
            debug!(peer = %peer_id, "session removed");
        }
        removed
    }

    /// Drop all sessions (disconnect-all, logout)
    pub fn clear_all(&self) {
        let mut map = self.inner.lock();
        let dropped = map.len();
        map.clear();
        if dropped > 0 {
            debug!(count = dropped, "cleared all sessions");
        }
    }

    /// Number of active sessions
    pub fn count(&self) -> usize {
        self.inner.lock().len()
    }
}
