//! Established session state and key derivation

use std::time::Instant;

use hkdf::Hkdf;
use parking_lot::Mutex;
use sha2::Sha256;
use x25519_dalek::SharedSecret;
use zeroize::{Zeroize, ZeroizeOnDrop};

use wire_protocol::DeviceId;

use crate::{CryptoError, CryptoResult, FILE_KEY_INFO, KEY_SIZE, MESSAGE_KEY_INFO};

/// Per-connection bundle of derived symmetric keys.
///
/// Key bytes are wiped when the last reference drops, so concurrent
/// teardown paths never race on zeroization.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Session {
    #[zeroize(skip)]
    peer_device_id: DeviceId,
    message_key: [u8; KEY_SIZE],
    file_key_material: [u8; KEY_SIZE],
    #[zeroize(skip)]
    created_at: Instant,
    #[zeroize(skip)]
    last_used_at: Mutex<Instant>,
}

impl Session {
    /// Derive a session from an X25519 shared secret.
    ///
    /// Both sides run this with byte-identical input, so the derived keys
    /// match. Distinct HKDF info labels separate the message and file key
    /// domains from the single ECDH output.
    pub fn derive(peer_device_id: DeviceId, shared_secret: &SharedSecret) -> CryptoResult<Self> {
        // A non-contributory result means the peer sent a low-order point
        if !shared_secret.was_contributory() {
            return Err(CryptoError::InvalidPublicKey);
        }

        let hk = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());

        let mut message_key = [0u8; KEY_SIZE];
        hk.expand(MESSAGE_KEY_INFO, &mut message_key)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        let mut file_key_material = [0u8; KEY_SIZE];
        hk.expand(FILE_KEY_INFO, &mut file_key_material)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        if message_key == file_key_material {
            message_key.zeroize();
            file_key_material.zeroize();
            return Err(CryptoError::KeyGeneration(
                "message and file keys collided".to_string(),
            ));
        }

        let now = Instant::now();
        Ok(Self {
            peer_device_id,
            message_key,
            file_key_material,
            created_at: now,
            last_used_at: Mutex::new(now),
        })
    }

    pub fn peer_device_id(&self) -> DeviceId {
        self.peer_device_id
    }

    /// Key for AES-256-GCM control messages
    pub(crate) fn message_key(&self) -> &[u8; KEY_SIZE] {
        &self.message_key
    }

    /// Key material for AES-256-CTR file streams
    pub(crate) fn file_key_material(&self) -> &[u8; KEY_SIZE] {
        &self.file_key_material
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_used_at(&self) -> Instant {
        *self.last_used_at.lock()
    }

    /// Record use of this session
    pub(crate) fn touch(&self) {
        *self.last_used_at.lock() = Instant::now();
    }
}

impl std::fmt::Debug for Session {
    // Never print key material
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer_device_id", &self.peer_device_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
