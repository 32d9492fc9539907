//! Wire Protocol Definitions for HyperConnect
//!
//! This crate contains the frame codec, handshake payloads, and identity
//! types shared across the HyperConnect secure-session stack.

mod error;
mod frames;
mod identity;
mod payloads;

pub use error::*;
pub use frames::*;
pub use identity::*;
pub use payloads::*;

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Frame header size: 1-byte type + 4-byte big-endian payload length
pub const FRAME_HEADER_SIZE: usize = 5;

/// Maximum frame payload size accepted by the codec
pub const MAX_FRAME_PAYLOAD: usize = 2 * 1024 * 1024;

/// IV size for encrypted control messages (AES-256-GCM, 96 bits)
pub const MESSAGE_IV_SIZE: usize = 12;

/// Authentication tag size for encrypted control messages (128 bits)
pub const MESSAGE_TAG_SIZE: usize = 16;

/// IV size for file stream encryption (AES-256-CTR, full block)
pub const STREAM_IV_SIZE: usize = 16;

/// Public key size for the handshake (Curve25519, 256 bits)
pub const PUBLIC_KEY_SIZE: usize = 32;
