//! Secure session error types

use thiserror::Error;

use wire_protocol::DeviceId;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid peer public key")]
    InvalidPublicKey,

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Authentication failed: ciphertext rejected")]
    AuthenticationFailed,

    #[error("Handshake rejected by peer {0}")]
    HandshakeRejected(DeviceId),

    #[error("Invalid handshake state: {0}")]
    State(&'static str),

    #[error("No session established with peer {0}")]
    SessionNotFound(DeviceId),

    #[error("Transfer overrun: received {received} bytes, declared {declared}")]
    TransferOverrun { received: u64, declared: u64 },
}

impl CryptoError {
    /// Whether this failure must tear down the session (fail-closed)
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
