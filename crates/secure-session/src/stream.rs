//! Streaming encryption of bulk file transfers
//!
//! AES-256-CTR keyed by the session's file key material. CTR carries no
//! integrity check, so chunks must be applied in strictly ascending,
//! gapless order on both ends; the transport is trusted for in-order
//! delivery and a whole-file checksum detects corruption after the fact.
//! The `&mut self` receiver on `apply` makes concurrent use of one
//! transfer's cursor unrepresentable.

use aes::Aes256;
use ctr::Ctr128BE;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Uuid;

use wire_protocol::{FileStreamInit, STREAM_IV_SIZE};

use crate::{CryptoError, CryptoResult, Session};

type Aes256Ctr = Ctr128BE<Aes256>;

/// Encrypts a file byte stream in place, one transfer per instance
pub struct StreamEncryptor {
    cipher: Aes256Ctr,
    iv: [u8; STREAM_IV_SIZE],
    bytes_processed: u64,
}

impl StreamEncryptor {
    /// Create an encryptor with a fresh random IV.
    ///
    /// The IV travels in `FILE_STREAM_INIT` and is not secret; only the
    /// key is. A (key, IV) pair must never be reused across transfers,
    /// which the per-instance random IV guarantees.
    pub fn new(session: &Session) -> CryptoResult<Self> {
        let mut iv = [0u8; STREAM_IV_SIZE];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        let cipher = Aes256Ctr::new_from_slices(session.file_key_material(), &iv)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        session.touch();

        Ok(Self {
            cipher,
            iv,
            bytes_processed: 0,
        })
    }

    /// The IV to announce in `FILE_STREAM_INIT`
    pub fn iv(&self) -> [u8; STREAM_IV_SIZE] {
        self.iv
    }

    /// Build the transfer announcement for this stream
    pub fn stream_init(&self, transfer_id: Uuid, file_size: u64) -> FileStreamInit {
        FileStreamInit {
            transfer_id,
            iv: self.iv,
            file_size,
        }
    }

    /// XOR keystream into the buffer in place, advancing the cursor.
    ///
    /// Output is deterministic given (key, IV, byte offset), so chunks
    /// must be fed in the exact order they will be decrypted.
    pub fn apply(&mut self, buffer: &mut [u8]) {
        self.cipher.apply_keystream(buffer);
        self.bytes_processed += buffer.len() as u64;
    }

    /// Total bytes encrypted so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }
}

/// Decrypts a file byte stream in place, mirroring `StreamEncryptor`
pub struct StreamDecryptor {
    cipher: Aes256Ctr,
    file_size: u64,
    bytes_processed: u64,
}

impl StreamDecryptor {
    /// Create a decryptor from the announced IV and declared file size
    pub fn new(session: &Session, iv: &[u8; STREAM_IV_SIZE], file_size: u64) -> CryptoResult<Self> {
        let cipher = Aes256Ctr::new_from_slices(session.file_key_material(), iv)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        session.touch();

        Ok(Self {
            cipher,
            file_size,
            bytes_processed: 0,
        })
    }

    /// XOR keystream into the buffer in place, advancing the cursor.
    ///
    /// Fails with `TransferOverrun` before touching the buffer if the
    /// cumulative input would exceed the declared file size.
    pub fn apply(&mut self, buffer: &mut [u8]) -> CryptoResult<()> {
        let received = self.bytes_processed + buffer.len() as u64;
        if received > self.file_size {
            return Err(CryptoError::TransferOverrun {
                received,
                declared: self.file_size,
            });
        }

        self.cipher.apply_keystream(buffer);
        self.bytes_processed = received;
        Ok(())
    }

    /// Total bytes decrypted so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Whether the declared file size has been fully received
    pub fn is_complete(&self) -> bool {
        self.bytes_processed == self.file_size
    }
}
