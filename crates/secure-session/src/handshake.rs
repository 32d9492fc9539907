//! Handshake state machine and session establishment
//!
//! Per-peer flow: IDLE -> HELLO_SENT (initiator) / HELLO_RECEIVED
//! (responder) -> ESTABLISHED -> CLOSED. Handshakes for distinct peers
//! proceed fully in parallel; within one peer's handshake the transitions
//! are sequential and a second `initiate` fails fast.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use wire_protocol::{DeviceId, EncryptedMessageFrame, HandshakeHello, HandshakeResponse, Identity};

use crate::{
    CryptoError, CryptoResult, KeyPair, PUBLIC_KEY_SIZE, Session, SessionStore, decrypt_message,
    encrypt_message, validate_public_key,
};

/// Drives handshakes and owns the resulting sessions.
///
/// The session registry is injected so independent instances can coexist
/// (one per connection pool, one per test).
pub struct HandshakeManager {
    sessions: Arc<SessionStore>,
    /// Initiator-side handshakes awaiting a response, keyed by peer
    pending: Mutex<HashMap<DeviceId, KeyPair>>,
    /// Responder-side record of the peer public key each session was
    /// derived from, so `finalize_handshake` can confirm independently
    /// of the response send
    responded: Mutex<HashMap<DeviceId, [u8; PUBLIC_KEY_SIZE]>>,
}

impl HandshakeManager {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            pending: Mutex::new(HashMap::new()),
            responded: Mutex::new(HashMap::new()),
        }
    }

    /// Start a handshake with a peer, producing the hello to transmit.
    ///
    /// Fails with a state error if a handshake is already pending for
    /// that peer; the first pending handshake is left untouched.
    pub fn initiate(&self, identity: &Identity, peer_id: DeviceId) -> CryptoResult<HandshakeHello> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&peer_id) {
            return Err(CryptoError::State("handshake already pending for peer"));
        }

        let keypair = KeyPair::generate();
        let hello = HandshakeHello {
            device_id: identity.device_id,
            display_name: identity.display_name.clone(),
            platform: identity.platform,
            app_version: identity.app_version.clone(),
            public_key: keypair.public_key_bytes(),
        };
        pending.insert(peer_id, keypair);

        debug!(peer = %peer_id, "handshake initiated");
        Ok(hello)
    }

    /// Respond to a received hello.
    ///
    /// On success the session is derived and stored before the response
    /// is returned, so the responder is ready for traffic the moment the
    /// peer completes. Any validation failure returns `accepted: false`
    /// and creates no session.
    pub fn handle_hello(&self, hello: &HandshakeHello, identity: &Identity) -> HandshakeResponse {
        let keypair = KeyPair::generate();
        let our_public = keypair.public_key_bytes();

        let accepted = match self.derive_for_hello(hello, keypair) {
            Ok(()) => true,
            Err(e) => {
                warn!(peer = %hello.device_id, error = %e, "rejected handshake hello");
                false
            }
        };

        HandshakeResponse {
            device_id: identity.device_id,
            display_name: identity.display_name.clone(),
            platform: identity.platform,
            app_version: identity.app_version.clone(),
            public_key: our_public,
            accepted,
        }
    }

    fn derive_for_hello(&self, hello: &HandshakeHello, keypair: KeyPair) -> CryptoResult<()> {
        validate_public_key(&hello.public_key)?;

        let shared_secret = keypair.diffie_hellman(&hello.public_key);
        let session = Session::derive(hello.device_id, &shared_secret)?;

        // A fresh hello from a peer with a live session means the peer
        // restarted: tear the stale session down before storing the new one
        if self.sessions.remove(hello.device_id).is_some() {
            info!(peer = %hello.device_id, "tore down stale session for new hello");
        }

        self.sessions.put(Arc::new(session));
        self.responded
            .lock()
            .insert(hello.device_id, hello.public_key);

        info!(peer = %hello.device_id, "session established (responder)");
        Ok(())
    }

    /// Complete an initiated handshake from the peer's response.
    ///
    /// Valid only while a hello is pending for that peer. The pending
    /// key pair is consumed either way; a rejection leaves no partial
    /// state and the caller may retry with a fresh handshake.
    pub fn complete_handshake(&self, response: &HandshakeResponse) -> CryptoResult<Arc<Session>> {
        let keypair = self
            .pending
            .lock()
            .remove(&response.device_id)
            .ok_or(CryptoError::State("no pending handshake for peer"))?;

        if !response.accepted {
            debug!(peer = %response.device_id, "handshake rejected by peer");
            return Err(CryptoError::HandshakeRejected(response.device_id));
        }

        validate_public_key(&response.public_key)?;

        let shared_secret = keypair.diffie_hellman(&response.public_key);
        let session = Arc::new(Session::derive(response.device_id, &shared_secret)?);

        if self.sessions.remove(response.device_id).is_some() {
            info!(peer = %response.device_id, "tore down stale session on completion");
        }
        self.sessions.put(session.clone());

        info!(peer = %response.device_id, "session established (initiator)");
        Ok(session)
    }

    /// Responder-side confirmation that the session created in
    /// `handle_hello` matches the given peer public key.
    ///
    /// Kept separate from the response send so the two steps are
    /// independently retryable.
    pub fn finalize_handshake(
        &self,
        peer_id: DeviceId,
        peer_public_key: &[u8; PUBLIC_KEY_SIZE],
    ) -> CryptoResult<Arc<Session>> {
        let recorded = self
            .responded
            .lock()
            .get(&peer_id)
            .copied()
            .ok_or(CryptoError::State("no handled hello for peer"))?;

        if recorded != *peer_public_key {
            return Err(CryptoError::InvalidPublicKey);
        }

        self.sessions
            .get(peer_id)
            .ok_or(CryptoError::SessionNotFound(peer_id))
    }

    /// Look up the active session for a peer
    pub fn get_session(&self, peer_id: DeviceId) -> Option<Arc<Session>> {
        self.sessions.get(peer_id)
    }

    /// Whether an active session exists for a peer
    pub fn has_session(&self, peer_id: DeviceId) -> bool {
        self.sessions.contains(peer_id)
    }

    /// Tear down a peer's session and any handshake bookkeeping
    pub fn remove_session(&self, peer_id: DeviceId) {
        self.pending.lock().remove(&peer_id);
        self.responded.lock().remove(&peer_id);
        self.sessions.remove(peer_id);
    }

    /// Number of established sessions
    pub fn session_count(&self) -> usize {
        self.sessions.count()
    }

    /// Number of initiated handshakes awaiting a response
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Encrypt a control message for a peer with an established session
    pub fn encrypt_message(
        &self,
        peer_id: DeviceId,
        plaintext: &[u8],
    ) -> CryptoResult<EncryptedMessageFrame> {
        let session = self
            .sessions
            .get(peer_id)
            .ok_or(CryptoError::SessionNotFound(peer_id))?;
        encrypt_message(&session, plaintext)
    }

    /// Decrypt a control message from a peer, fail-closed.
    ///
    /// An authentication failure tears the session down before the error
    /// propagates; there is no retry and no unencrypted fallback.
    pub fn decrypt_message(
        &self,
        peer_id: DeviceId,
        frame: &EncryptedMessageFrame,
    ) -> CryptoResult<Vec<u8>> {
        let session = self
            .sessions
            .get(peer_id)
            .ok_or(CryptoError::SessionNotFound(peer_id))?;

        match decrypt_message(&session, frame) {
            Err(e) if e.is_fatal_to_session() => {
                warn!(peer = %peer_id, "authentication failure, terminating session");
                self.remove_session(peer_id);
                Err(e)
            }
            other => other,
        }
    }
}
