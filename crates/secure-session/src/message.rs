//! Authenticated encryption of discrete control messages

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;

use wire_protocol::{EncryptedMessageFrame, MESSAGE_IV_SIZE, MESSAGE_TAG_SIZE};

use crate::{CryptoError, CryptoResult, MAX_MESSAGE_SIZE, Session};

/// Encrypt a control message with the session's message key.
///
/// Each message gets a fresh random 12-byte IV. Random rather than a
/// counter: messages may be produced concurrently by independent senders
/// on the same session.
pub fn encrypt_message(session: &Session, plaintext: &[u8]) -> CryptoResult<EncryptedMessageFrame> {
    // Size bound enforced before any AES work
    if plaintext.len() > MAX_MESSAGE_SIZE {
        return Err(CryptoError::MessageTooLarge {
            size: plaintext.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let cipher = Aes256Gcm::new_from_slice(session.message_key())
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    let mut iv = [0u8; MESSAGE_IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    let mut sealed = cipher
        .encrypt(Nonce::from_slice(&iv), Payload::from(plaintext))
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    // AEAD output is ciphertext || tag; the wire frame carries them apart
    let tag_offset = sealed.len() - MESSAGE_TAG_SIZE;
    let mut tag = [0u8; MESSAGE_TAG_SIZE];
    tag.copy_from_slice(&sealed[tag_offset..]);
    sealed.truncate(tag_offset);

    session.touch();

    Ok(EncryptedMessageFrame {
        iv,
        tag,
        ciphertext: sealed,
    })
}

/// Decrypt and verify a control message.
///
/// A tag mismatch yields `AuthenticationFailed`, which is fatal to the
/// session: the caller must tear it down, never retry the ciphertext.
pub fn decrypt_message(session: &Session, frame: &EncryptedMessageFrame) -> CryptoResult<Vec<u8>> {
    if frame.ciphertext.len() > MAX_MESSAGE_SIZE {
        return Err(CryptoError::MessageTooLarge {
            size: frame.ciphertext.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let cipher = Aes256Gcm::new_from_slice(session.message_key())
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    let mut sealed = Vec::with_capacity(frame.ciphertext.len() + MESSAGE_TAG_SIZE);
    sealed.extend_from_slice(&frame.ciphertext);
    sealed.extend_from_slice(&frame.tag);

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&frame.iv), Payload::from(sealed.as_slice()))
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    session.touch();

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;
    use wire_protocol::DeviceId;

    fn session_pair() -> (Session, Session) {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let a_public = a.public_key_bytes();
        let b_public = b.public_key_bytes();
        (
            Session::derive(DeviceId::new(), &a.diffie_hellman(&b_public)).unwrap(),
            Session::derive(DeviceId::new(), &b.diffie_hellman(&a_public)).unwrap(),
        )
    }

    #[test]
    fn round_trip() {
        let (alice, bob) = session_pair();
        let plaintext = br#"{"type":"TEXT_MESSAGE","content":"Hello!"}"#;

        let frame = encrypt_message(&alice, plaintext).unwrap();
        let recovered = decrypt_message(&bob, &frame).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn round_trip_empty_message() {
        let (alice, bob) = session_pair();
        let frame = encrypt_message(&alice, b"").unwrap();
        assert!(decrypt_message(&bob, &frame).unwrap().is_empty());
    }

    #[test]
    fn same_plaintext_yields_different_ciphertexts() {
        let (alice, _) = session_pair();
        let first = encrypt_message(&alice, b"repeat").unwrap();
        let second = encrypt_message(&alice, b"repeat").unwrap();
        assert_ne!(first.iv, second.iv);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let (alice, bob) = session_pair();
        let mut frame = encrypt_message(&alice, b"integrity matters").unwrap();
        frame.ciphertext[0] ^= 0x01;
        assert!(matches!(
            decrypt_message(&bob, &frame),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let (alice, bob) = session_pair();
        let mut frame = encrypt_message(&alice, b"integrity matters").unwrap();
        frame.tag[15] ^= 0x80;
        assert!(matches!(
            decrypt_message(&bob, &frame),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn tampered_iv_fails_authentication() {
        let (alice, bob) = session_pair();
        let mut frame = encrypt_message(&alice, b"integrity matters").unwrap();
        frame.iv[0] ^= 0x01;
        assert!(matches!(
            decrypt_message(&bob, &frame),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    #[test]
    fn oversized_plaintext_rejected_before_encryption() {
        let (alice, _) = session_pair();
        let oversized = vec![0u8; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            encrypt_message(&alice, &oversized),
            Err(CryptoError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn max_size_plaintext_accepted() {
        let (alice, bob) = session_pair();
        let plaintext = vec![0xA5u8; MAX_MESSAGE_SIZE];
        let frame = encrypt_message(&alice, &plaintext).unwrap();
        assert_eq!(decrypt_message(&bob, &frame).unwrap(), plaintext);
    }

    #[test]
    fn oversized_ciphertext_rejected_before_decryption() {
        let (_, bob) = session_pair();
        let frame = EncryptedMessageFrame {
            iv: [0; MESSAGE_IV_SIZE],
            tag: [0; MESSAGE_TAG_SIZE],
            ciphertext: vec![0u8; MAX_MESSAGE_SIZE + 1],
        };
        assert!(matches!(
            decrypt_message(&bob, &frame),
            Err(CryptoError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn cross_session_decryption_fails() {
        let (alice, _) = session_pair();
        let (_, mallory) = session_pair();
        let frame = encrypt_message(&alice, b"for bob only").unwrap();
        assert!(matches!(
            decrypt_message(&mallory, &frame),
            Err(CryptoError::AuthenticationFailed)
        ));
    }
}
