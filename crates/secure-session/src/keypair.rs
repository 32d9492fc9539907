//! Ephemeral Curve25519 key pairs

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret};

use crate::{CryptoError, CryptoResult, PUBLIC_KEY_SIZE};

/// Key pair for ephemeral key exchange, one per handshake attempt
pub struct KeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new ephemeral key pair from the OS RNG
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Get the public key bytes for transmission
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Perform Diffie-Hellman key exchange, consuming the secret
    pub fn diffie_hellman(self, their_public: &[u8; PUBLIC_KEY_SIZE]) -> SharedSecret {
        let their_public = PublicKey::from(*their_public);
        self.secret.diffie_hellman(&their_public)
    }
}

/// Reject public keys that can only produce a non-contributory exchange.
///
/// The identity point is caught here before any DH work; the remaining
/// low-order points are caught after DH via `SharedSecret::was_contributory`.
pub fn validate_public_key(public_key: &[u8; PUBLIC_KEY_SIZE]) -> CryptoResult<()> {
    if public_key.iter().all(|b| *b == 0) {
        return Err(CryptoError::InvalidPublicKey);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_distinct() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn shared_secret_agreement() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let a_public = a.public_key_bytes();
        let b_public = b.public_key_bytes();

        let secret_a = a.diffie_hellman(&b_public);
        let secret_b = b.diffie_hellman(&a_public);
        assert_eq!(secret_a.as_bytes(), secret_b.as_bytes());
        assert!(secret_a.was_contributory());
    }

    #[test]
    fn identity_point_is_rejected() {
        assert!(matches!(
            validate_public_key(&[0u8; PUBLIC_KEY_SIZE]),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn valid_key_passes_validation() {
        let pair = KeyPair::generate();
        assert!(validate_public_key(&pair.public_key_bytes()).is_ok());
    }
}
