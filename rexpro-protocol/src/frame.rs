//! Fixed frame header for RexPro.
//!
//! Header layout (11 bytes, followed by `body_len` bytes of body):
//!
//! ```text
//! +---------+------------+----------+--------------+----------+
//! | version | serializer | reserved | message_type | body_len |
//! | 1 byte  |   1 byte   | 4 bytes  |    1 byte    | 4 bytes  |
//! +---------+------------+----------+--------------+----------+
//! ```
//!
//! Multi-byte fields are big-endian. The reserved bytes are always written as
//! zero and ignored when reading.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, BytesMut};

/// Size of the fixed frame header in bytes (1+1+4+1+4 = 11).
pub const HEADER_SIZE: usize = 11;

/// Reserved header bytes, always zero on the wire.
pub const RESERVED: [u8; 4] = [0; 4];

/// A parsed frame header.
///
/// Fields are kept as raw wire values; interpreting the serializer and message
/// type ids is left to the caller so that decoding never fails on an unknown
/// id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version.
    pub version: u8,
    /// Serializer type id.
    pub serializer: u8,
    /// Message type id.
    pub message_type: u8,
    /// Body length in bytes.
    pub body_len: u32,
}

impl Header {
    pub fn new(version: u8, serializer: u8, message_type: u8, body_len: u32) -> Self {
        Self {
            version,
            serializer,
            message_type,
            body_len,
        }
    }

    /// Encodes the header into its 11-byte wire form.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        self.encode_into(&mut buf);
        buf
    }

    /// Appends the header to `buf`.
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.serializer);
        buf.put_slice(&RESERVED);
        buf.put_u8(self.message_type);
        buf.put_u32(self.body_len);
    }

    /// Decodes a header from the first 11 bytes of `buf`.
    ///
    /// Extra bytes after the header are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::TruncatedHeader { len: buf.len() });
        }

        let mut buf = &buf[..HEADER_SIZE];
        let version = buf.get_u8();
        let serializer = buf.get_u8();
        buf.advance(RESERVED.len());
        let message_type = buf.get_u8();
        let body_len = buf.get_u32();

        Ok(Self {
            version,
            serializer,
            message_type,
            body_len,
        })
    }
}

/// Encodes a body length as 4 big-endian bytes.
pub fn encode_length(len: u64) -> Result<[u8; 4], ProtocolError> {
    let len = u32::try_from(len).map_err(|_| ProtocolError::InvalidLength(len))?;
    Ok(len.to_be_bytes())
}

/// Converts an in-memory byte count to the header's 32-bit length field.
pub(crate) fn body_len(len: usize) -> Result<u32, ProtocolError> {
    u32::try_from(len).map_err(|_| ProtocolError::InvalidLength(len as u64))
}
