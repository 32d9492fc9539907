//! Payload definitions for the secure-session frames

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    DeviceId, MESSAGE_IV_SIZE, MESSAGE_TAG_SIZE, PUBLIC_KEY_SIZE, Platform, ProtocolError,
    ProtocolResult, STREAM_IV_SIZE,
};

/// Handshake hello, one per attempt (`HELLO_SECURE`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeHello {
    pub device_id: DeviceId,
    pub display_name: String,
    pub platform: Platform,
    pub app_version: String,
    pub public_key: [u8; PUBLIC_KEY_SIZE],
}

impl HandshakeHello {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> ProtocolResult<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Handshake response (`HELLO_RESPONSE`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub device_id: DeviceId,
    pub display_name: String,
    pub platform: Platform,
    pub app_version: String,
    pub public_key: [u8; PUBLIC_KEY_SIZE],
    pub accepted: bool,
}

impl HandshakeResponse {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> ProtocolResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes
    pub fn from_bytes(data: &[u8]) -> ProtocolResult<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

/// Encrypted control message (`ENCRYPTED_MESSAGE`)
///
/// Wire layout is fixed: `iv(12) || tag(16) || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessageFrame {
    pub iv: [u8; MESSAGE_IV_SIZE],
    pub tag: [u8; MESSAGE_TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedMessageFrame {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buf =
            BytesMut::with_capacity(MESSAGE_IV_SIZE + MESSAGE_TAG_SIZE + self.ciphertext.len());
        buf.put_slice(&self.iv);
        buf.put_slice(&self.tag);
        buf.put_slice(&self.ciphertext);
        buf.freeze()
    }

    /// Deserialize from received bytes
    pub fn from_bytes(data: &[u8]) -> ProtocolResult<Self> {
        const HEADER: usize = MESSAGE_IV_SIZE + MESSAGE_TAG_SIZE;
        if data.len() < HEADER {
            return Err(ProtocolError::TruncatedPayload {
                expected: HEADER,
                actual: data.len(),
            });
        }

        let mut iv = [0u8; MESSAGE_IV_SIZE];
        iv.copy_from_slice(&data[..MESSAGE_IV_SIZE]);
        let mut tag = [0u8; MESSAGE_TAG_SIZE];
        tag.copy_from_slice(&data[MESSAGE_IV_SIZE..HEADER]);

        Ok(Self {
            iv,
            tag,
            ciphertext: data[HEADER..].to_vec(),
        })
    }
}

/// File transfer announcement (`FILE_STREAM_INIT`)
///
/// Wire layout is fixed: `transfer_id(16) || iv(16) || file_size(8, BE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStreamInit {
    pub transfer_id: Uuid,
    pub iv: [u8; STREAM_IV_SIZE],
    pub file_size: u64,
}

impl FileStreamInit {
    const WIRE_SIZE: usize = 16 + STREAM_IV_SIZE + 8;

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::WIRE_SIZE);
        buf.put_slice(self.transfer_id.as_bytes());
        buf.put_slice(&self.iv);
        buf.put_u64(self.file_size);
        buf.freeze()
    }

    /// Deserialize from received bytes
    pub fn from_bytes(data: &[u8]) -> ProtocolResult<Self> {
        if data.len() < Self::WIRE_SIZE {
            return Err(ProtocolError::TruncatedPayload {
                expected: Self::WIRE_SIZE,
                actual: data.len(),
            });
        }

        let mut id_bytes = [0u8; 16];
        id_bytes.copy_from_slice(&data[..16]);
        let mut iv = [0u8; STREAM_IV_SIZE];
        iv.copy_from_slice(&data[16..16 + STREAM_IV_SIZE]);
        let mut size_bytes = [0u8; 8];
        size_bytes.copy_from_slice(&data[16 + STREAM_IV_SIZE..Self::WIRE_SIZE]);

        Ok(Self {
            transfer_id: Uuid::from_bytes(id_bytes),
            iv,
            file_size: u64::from_be_bytes(size_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trip() {
        let hello = HandshakeHello {
            device_id: DeviceId::new(),
            display_name: "Alice's Laptop".to_string(),
            platform: Platform::MacOs,
            app_version: "0.1.0".to_string(),
            public_key: [0x42; PUBLIC_KEY_SIZE],
        };
        let decoded = HandshakeHello::from_bytes(&hello.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.device_id, hello.device_id);
        assert_eq!(decoded.public_key, hello.public_key);
        assert_eq!(decoded.display_name, hello.display_name);
    }

    #[test]
    fn response_carries_accepted_flag() {
        let response = HandshakeResponse {
            device_id: DeviceId::new(),
            display_name: "Bob's Desktop".to_string(),
            platform: Platform::Windows,
            app_version: "0.1.0".to_string(),
            public_key: [7; PUBLIC_KEY_SIZE],
            accepted: false,
        };
        let decoded = HandshakeResponse::from_bytes(&response.to_bytes().unwrap()).unwrap();
        assert!(!decoded.accepted);
    }

    #[test]
    fn encrypted_message_wire_layout() {
        let frame = EncryptedMessageFrame {
            iv: [1; MESSAGE_IV_SIZE],
            tag: [2; MESSAGE_TAG_SIZE],
            ciphertext: vec![3, 4, 5],
        };
        let bytes = frame.to_bytes();
        assert_eq!(&bytes[..12], &[1; 12]);
        assert_eq!(&bytes[12..28], &[2; 16]);
        assert_eq!(&bytes[28..], &[3, 4, 5]);
        assert_eq!(EncryptedMessageFrame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn encrypted_message_allows_empty_ciphertext() {
        let frame = EncryptedMessageFrame {
            iv: [0; MESSAGE_IV_SIZE],
            tag: [0; MESSAGE_TAG_SIZE],
            ciphertext: Vec::new(),
        };
        let decoded = EncryptedMessageFrame::from_bytes(&frame.to_bytes()).unwrap();
        assert!(decoded.ciphertext.is_empty());
    }

    #[test]
    fn encrypted_message_rejects_truncated() {
        assert!(matches!(
            EncryptedMessageFrame::from_bytes(&[0u8; 27]),
            Err(ProtocolError::TruncatedPayload { .. })
        ));
    }

    #[test]
    fn file_stream_init_round_trip() {
        let init = FileStreamInit {
            transfer_id: Uuid::new_v4(),
            iv: [0xAB; STREAM_IV_SIZE],
            file_size: 1_048_577,
        };
        let bytes = init.to_bytes();
        assert_eq!(bytes.len(), 40);
        assert_eq!(FileStreamInit::from_bytes(&bytes).unwrap(), init);
    }

    #[test]
    fn file_stream_init_rejects_truncated() {
        assert!(matches!(
            FileStreamInit::from_bytes(&[0u8; 39]),
            Err(ProtocolError::TruncatedPayload { .. })
        ));
    }
}
