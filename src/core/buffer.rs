//! # Byte Buffer
//!
//! Growable byte sequence with a single read/write cursor.
//!
//! ## Wire Encoding
//! All multi-byte numerics are little-endian.
//! ```text
//! int32 / uint32 / float / id   4 bytes
//! byte / bool                   1 byte
//! string                        [len: u32 LE][len bytes UTF-8]
//! vector                        [x][y][z]           12 bytes
//! rotator                       [pitch][yaw][roll]  12 bytes
//! ```
//!
//! ## Cursor Rules
//! - Writes append to the data and advance the cursor by the written size.
//! - Reads consume from the cursor forward.
//! - A read that needs more bytes than remain returns
//!   [`ProtocolError::BufferUnderrun`] and leaves the cursor untouched.
//!
//! ## Usage
//! ```rust
//! use netframe::core::buffer::ByteBuffer;
//!
//! let mut out = ByteBuffer::new();
//! out.put_int32(42).put_string("Nova").put_bool(true);
//!
//! let mut input = ByteBuffer::from_bytes(out.into_vec());
//! assert_eq!(input.get_int32().unwrap(), 42);
//! assert_eq!(input.get_string().unwrap(), "Nova");
//! assert!(input.get_bool().unwrap());
//! ```

use crate::core::base36;
use crate::core::value::{Rotator, Vector3};
use crate::error::{ProtocolError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{Buf, BufMut, Bytes};
use std::fmt::Write as _;
use tracing::warn;

/// Size of the little-endian length prefix in front of strings
const STRING_PREFIX_LEN: usize = 4;

/// Byte buffer with a read/write cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
    /// Advisory packet type, only used to label diagnostics
    packet_type: u8,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Wrap existing bytes, cursor at the start
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Decode a buffer from its standard base64 text form
    pub fn from_base64(text: &str) -> Result<Self> {
        let data = STANDARD
            .decode(text.trim())
            .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))?;
        Ok(Self::from_bytes(data))
    }

    /// Whole-buffer standard base64 text form
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes between the cursor and the end of the data
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Move the cursor; positions past the end are rejected
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(ProtocolError::BufferUnderrun {
                needed: position,
                remaining: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    pub fn set_packet_type(&mut self, packet_type: u8) {
        self.packet_type = packet_type;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Hand the bytes off as a shared, immutable buffer
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.data)
    }

    /// Concatenate another buffer's bytes; the cursor moves to the new end
    pub fn append(&mut self, other: &ByteBuffer) {
        self.data.reserve(other.data.len());
        self.data.extend_from_slice(&other.data);
        self.position = self.data.len();
    }

    /// Append raw bytes, advancing the cursor by their length
    pub fn put_slice(&mut self, bytes: &[u8]) -> &mut Self {
        self.ensure_capacity(bytes.len());
        self.data.put_slice(bytes);
        self.position += bytes.len();
        self
    }

    pub fn put_int32(&mut self, value: i32) -> &mut Self {
        self.ensure_capacity(4);
        self.data.put_i32_le(value);
        self.position += 4;
        self
    }

    pub fn put_uint32(&mut self, value: u32) -> &mut Self {
        self.ensure_capacity(4);
        self.data.put_u32_le(value);
        self.position += 4;
        self
    }

    pub fn put_byte(&mut self, value: u8) -> &mut Self {
        self.ensure_capacity(1);
        self.data.put_u8(value);
        self.position += 1;
        self
    }

    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.put_byte(u8::from(value))
    }

    pub fn put_float(&mut self, value: f32) -> &mut Self {
        self.ensure_capacity(4);
        self.data.put_f32_le(value);
        self.position += 4;
        self
    }

    /// Write a length-prefixed UTF-8 string; the prefix counts bytes, not chars
    pub fn put_string(&mut self, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        self.ensure_capacity(STRING_PREFIX_LEN + bytes.len());
        self.put_uint32(bytes.len() as u32);
        self.put_slice(bytes)
    }

    pub fn put_vector3(&mut self, value: Vector3) -> &mut Self {
        self.ensure_capacity(12);
        self.put_float(value.x).put_float(value.y).put_float(value.z)
    }

    pub fn put_rotator(&mut self, value: Rotator) -> &mut Self {
        self.ensure_capacity(12);
        self.put_float(value.pitch)
            .put_float(value.yaw)
            .put_float(value.roll)
    }

    /// Write a base-36 identifier token as its 32-bit integer value
    pub fn put_id(&mut self, token: &str) -> Result<&mut Self> {
        let value = base36::decode(token)?;
        Ok(self.put_int32(value))
    }

    pub fn get_int32(&mut self) -> Result<i32> {
        let mut src = self.take(4)?;
        Ok(src.get_i32_le())
    }

    pub fn get_uint32(&mut self) -> Result<u32> {
        let mut src = self.take(4)?;
        Ok(src.get_u32_le())
    }

    pub fn get_byte(&mut self) -> Result<u8> {
        let mut src = self.take(1)?;
        Ok(src.get_u8())
    }

    /// Any non-zero byte reads as `true`
    pub fn get_bool(&mut self) -> Result<bool> {
        Ok(self.get_byte()? != 0)
    }

    pub fn get_float(&mut self) -> Result<f32> {
        let mut src = self.take(4)?;
        Ok(src.get_f32_le())
    }

    /// Read a length-prefixed string. On underrun the cursor stays in front
    /// of the length prefix.
    pub fn get_string(&mut self) -> Result<String> {
        let start = self.position;
        let declared = self.get_int32()?;

        let len = match usize::try_from(declared) {
            Ok(len) if len <= self.remaining() => len,
            _ => {
                self.position = start;
                return Err(ProtocolError::BufferUnderrun {
                    needed: STRING_PREFIX_LEN + declared as u32 as usize,
                    remaining: self.remaining(),
                });
            }
        };

        let packet_type = self.packet_type;
        let bytes = self.take(len)?;
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!(packet_type, error = %e, "String field is not valid UTF-8");
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        Ok(text)
    }

    /// Read three floats as X, Y, Z; all-or-nothing on underrun
    pub fn get_vector3(&mut self) -> Result<Vector3> {
        self.require(12)?;
        Ok(Vector3::new(
            self.get_float()?,
            self.get_float()?,
            self.get_float()?,
        ))
    }

    /// Read three floats as Pitch, Yaw, Roll; all-or-nothing on underrun
    pub fn get_rotator(&mut self) -> Result<Rotator> {
        self.require(12)?;
        Ok(Rotator::new(
            self.get_float()?,
            self.get_float()?,
            self.get_float()?,
        ))
    }

    /// Read a 32-bit integer and render it as a base-36 identifier token
    pub fn get_id(&mut self) -> Result<String> {
        Ok(base36::encode(self.get_int32()?))
    }

    /// Lowercase hex dump, two digits per byte
    pub fn to_hex_string(&self) -> String {
        let mut out = String::with_capacity(self.data.len() * 2);
        for byte in &self.data {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Comma separated decimal dump, e.g. `1, 254, 0`
    pub fn to_decimal_list(&self) -> String {
        self.data
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn ensure_capacity(&mut self, additional: usize) {
        if self.data.len() + additional > self.data.capacity() {
            self.data.reserve(additional);
        }
    }

    fn require(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ProtocolError::BufferUnderrun { needed, remaining });
        }
        Ok(())
    }

    /// Borrow the next `len` bytes and advance past them
    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.require(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.data[start..start + len])
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int32_is_little_endian() {
        let mut buf = ByteBuffer::new();
        buf.put_int32(0x0403_0201);
        assert_eq!(buf.as_slice(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf.position(), 4);
    }

    #[test]
    fn test_negative_int32_roundtrip() {
        let mut buf = ByteBuffer::new();
        buf.put_int32(-2).put_uint32(u32::MAX);
        buf.rewind();
        assert_eq!(buf.get_int32().unwrap(), -2);
        assert_eq!(buf.get_uint32().unwrap(), u32::MAX);
    }

    #[test]
    fn test_float_bytes() {
        let mut buf = ByteBuffer::new();
        buf.put_float(1.0);
        assert_eq!(buf.as_slice(), &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        let mut buf = ByteBuffer::from_bytes(vec![0, 1, 7]);
        assert!(!buf.get_bool().unwrap());
        assert!(buf.get_bool().unwrap());
        assert!(buf.get_bool().unwrap());
    }

    #[test]
    fn test_string_prefix_counts_bytes() {
        let mut buf = ByteBuffer::new();
        buf.put_string("héllo✓");
        let byte_len = "héllo✓".len();
        assert_eq!(&buf.as_slice()[..4], &(byte_len as u32).to_le_bytes());
        assert_eq!(buf.len(), 4 + byte_len);

        buf.rewind();
        assert_eq!(buf.get_string().unwrap(), "héllo✓");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_empty_string() {
        let mut buf = ByteBuffer::new();
        buf.put_string("");
        buf.rewind();
        assert_eq!(buf.get_string().unwrap(), "");
        assert_eq!(buf.position(), 4);
    }

    #[test]
    fn test_underrun_leaves_cursor() {
        let mut buf = ByteBuffer::from_bytes(vec![1, 2, 3]);
        let err = buf.get_int32().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::BufferUnderrun {
                needed: 4,
                remaining: 3
            }
        ));
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.get_byte().unwrap(), 1);
    }

    #[test]
    fn test_truncated_string_rewinds_prefix() {
        let mut buf = ByteBuffer::new();
        buf.put_uint32(10).put_slice(b"abc");
        buf.rewind();
        assert!(matches!(
            buf.get_string(),
            Err(ProtocolError::BufferUnderrun { .. })
        ));
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_negative_string_length_is_underrun() {
        let mut buf = ByteBuffer::new();
        buf.put_int32(-1).put_slice(b"abcd");
        buf.rewind();
        assert!(buf.get_string().is_err());
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_vector_underrun_is_atomic() {
        let mut buf = ByteBuffer::new();
        buf.put_float(1.0).put_float(2.0);
        buf.rewind();
        assert!(buf.get_vector3().is_err());
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn test_vector_and_rotator_order() {
        let mut buf = ByteBuffer::new();
        buf.put_vector3(Vector3::new(1.0, 2.0, 3.0))
            .put_rotator(Rotator::new(10.0, 20.0, 30.0));
        buf.rewind();
        assert_eq!(buf.get_float().unwrap(), 1.0);
        buf.set_position(12).unwrap();
        assert_eq!(buf.get_float().unwrap(), 10.0);
        buf.rewind();
        assert_eq!(buf.get_vector3().unwrap(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(buf.get_rotator().unwrap(), Rotator::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_id_roundtrip() {
        let mut buf = ByteBuffer::new();
        buf.put_id("5").unwrap();
        buf.put_id("zz").unwrap();
        assert_eq!(&buf.as_slice()[..4], &[5, 0, 0, 0]);
        buf.rewind();
        assert_eq!(buf.get_id().unwrap(), "5");
        assert_eq!(buf.get_id().unwrap(), "ZZ");
    }

    #[test]
    fn test_put_id_rejects_invalid_token() {
        let mut buf = ByteBuffer::new();
        assert!(matches!(buf.put_id("!?"), Err(ProtocolError::InvalidId(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_base64_roundtrip() {
        let mut buf = ByteBuffer::new();
        buf.put_string("Nova").put_int32(7);
        let text = buf.to_base64();
        let restored = ByteBuffer::from_base64(&text).unwrap();
        assert_eq!(restored.as_slice(), buf.as_slice());
        assert_eq!(restored.position(), 0);
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            ByteBuffer::from_base64("not base64!"),
            Err(ProtocolError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_append_moves_cursor_to_end() {
        let mut a = ByteBuffer::from_bytes(vec![1, 2]);
        let b = ByteBuffer::from_bytes(vec![3, 4, 5]);
        a.append(&b);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(a.position(), 5);
    }

    #[test]
    fn test_dumps() {
        let buf = ByteBuffer::from_bytes(vec![0x01, 0xFE, 0x00]);
        assert_eq!(buf.to_hex_string(), "01fe00");
        assert_eq!(buf.to_decimal_list(), "1, 254, 0");
    }

    #[test]
    fn test_set_position_past_end_rejected() {
        let mut buf = ByteBuffer::from_bytes(vec![1, 2]);
        assert!(buf.set_position(3).is_err());
        assert!(buf.set_position(2).is_ok());
        assert_eq!(buf.remaining(), 0);
    }
}
