//! Frame codec: `[1-byte type][4-byte big-endian length][payload]`

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD, ProtocolError, ProtocolResult};

/// Type of frame being transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    /// Raw encrypted file chunk
    FileData = 0x04,
    /// Handshake hello with ephemeral public key
    HelloSecure = 0x10,
    /// Handshake response (accept/reject)
    HelloResponse = 0x11,
    /// Encrypted control message
    EncryptedMessage = 0x12,
    /// File transfer announcement with stream IV
    FileStreamInit = 0x13,
}

impl TryFrom<u8> for FrameType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> ProtocolResult<Self> {
        match value {
            0x04 => Ok(Self::FileData),
            0x10 => Ok(Self::HelloSecure),
            0x11 => Ok(Self::HelloResponse),
            0x12 => Ok(Self::EncryptedMessage),
            0x13 => Ok(Self::FileStreamInit),
            other => Err(ProtocolError::InvalidFrameType(other)),
        }
    }
}

/// A complete wire frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(frame_type: FrameType, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_type,
            payload: payload.into(),
        }
    }
}

/// Encoder/decoder for the length-prefixed wire framing
pub struct FrameCodec;

impl FrameCodec {
    /// Serialize a frame to bytes for transmission
    pub fn encode(frame: &Frame) -> ProtocolResult<Bytes> {
        if frame.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: frame.payload.len(),
                max: MAX_FRAME_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + frame.payload.len());
        buf.put_u8(frame.frame_type as u8);
        buf.put_u32(frame.payload.len() as u32);
        buf.put_slice(&frame.payload);
        Ok(buf.freeze())
    }

    /// Decode one frame from a read buffer, consuming its bytes.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete
    /// frame; callers keep appending transport reads and retry.
    pub fn decode(buf: &mut BytesMut) -> ProtocolResult<Option<Frame>> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        // Validate the header without consuming so a short buffer stays intact
        let frame_type = FrameType::try_from(buf[0])?;
        let len = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        if len > MAX_FRAME_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                size: len,
                max: MAX_FRAME_PAYLOAD,
            });
        }

        if buf.len() < FRAME_HEADER_SIZE + len {
            return Ok(None);
        }

        buf.advance(FRAME_HEADER_SIZE);
        let payload = buf.split_to(len).freeze();
        Ok(Some(Frame {
            frame_type,
            payload,
        }))
    }
}
