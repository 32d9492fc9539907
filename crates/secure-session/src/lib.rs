//! Secure Session - End-to-End Encryption for HyperConnect
//!
//! Provides the X25519 handshake with HKDF key separation, AES-256-GCM
//! control-message encryption, and AES-256-CTR file-stream encryption.

mod error;
mod handshake;
mod keypair;
mod message;
mod session;
mod store;
mod stream;

pub use error::*;
pub use handshake::*;
pub use keypair::*;
pub use message::*;
pub use session::*;
pub use store::*;
pub use stream::*;

/// Public key size (256 bits / 32 bytes)
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Derived symmetric key size (256 bits / 32 bytes)
pub const KEY_SIZE: usize = 32;

/// Maximum plaintext/ciphertext size for a single control message (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// HKDF info label for the control-message key domain
pub const MESSAGE_KEY_INFO: &[u8] = b"hyperconnect-msg-v1";

/// HKDF info label for the file-stream key domain
pub const FILE_KEY_INFO: &[u8] = b"hyperconnect-file-v1";
