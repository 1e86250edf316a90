//! Minimal protobuf wire codec
//!
//! Only what record decoding needs: varints, length-delimited fields and
//! skipping of fixed-width fields. Groups are rejected.

use crate::error::{LogError, LogResult};

/// Protobuf wire type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Variable-length integer
    Varint,
    /// Eight little-endian bytes
    Fixed64,
    /// Length-prefixed bytes (strings, messages, packed fields)
    LengthDelimited,
    /// Four little-endian bytes
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u64) -> LogResult<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            3 | 4 => Err(LogError::malformed("group wire types are not supported")),
            other => Err(LogError::malformed(format!("invalid wire type {}", other))),
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

/// Cursor over one encoded message
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Read from the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    /// All bytes consumed
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Read a base-128 varint
    pub fn read_varint(&mut self) -> LogResult<u64> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| LogError::malformed("truncated varint"))?;
            self.pos += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(LogError::malformed("varint longer than 10 bytes"))
    }

    /// Read the next field key, or `None` at end of message
    pub fn read_key(&mut self) -> LogResult<Option<(u32, WireType)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let key = self.read_varint()?;
        let field = key >> 3;
        if field == 0 || field > u64::from(u32::MAX >> 3) {
            return Err(LogError::malformed(format!("invalid field number {}", field)));
        }
        Ok(Some((field as u32, WireType::from_bits(key & 0x7)?)))
    }

    fn take(&mut self, len: usize) -> LogResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| LogError::malformed("field runs past end of message"))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Read a length-delimited payload
    pub fn read_bytes(&mut self) -> LogResult<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| LogError::malformed("length overflow"))?;
        self.take(len)
    }

    /// Read a length-delimited UTF-8 string
    pub fn read_string(&mut self) -> LogResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| LogError::malformed("string is not UTF-8"))
    }

    /// Skip a field's value
    pub fn skip(&mut self, wire_type: WireType) -> LogResult<()> {
        match wire_type {
            WireType::Varint => self.read_varint().map(|_| ()),
            WireType::Fixed64 => self.take(8).map(|_| ()),
            WireType::Fixed32 => self.take(4).map(|_| ()),
            WireType::LengthDelimited => self.read_bytes().map(|_| ()),
        }
    }
}

/// Fail unless a known field arrived with the expected wire type
pub fn expect_wire_type(field: u32, actual: WireType, expected: WireType) -> LogResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(LogError::malformed(format!(
            "field {} has wire type {:?}, expected {:?}",
            field, actual, expected
        )))
    }
}

/// Message encoder used to build fixture logs
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default, Clone)]
pub struct ProtoWriter {
    buf: Vec<u8>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ProtoWriter {
    /// Empty message
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw varint
    pub fn varint(&mut self, mut value: u64) -> &mut Self {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
        self
    }

    /// Append a field key
    pub fn key(&mut self, field: u32, wire_type: WireType) -> &mut Self {
        self.varint((u64::from(field) << 3) | wire_type.bits())
    }

    /// Append a varint field
    pub fn uint_field(&mut self, field: u32, value: u64) -> &mut Self {
        self.key(field, WireType::Varint).varint(value)
    }

    /// Append a length-delimited field
    pub fn bytes_field(&mut self, field: u32, bytes: &[u8]) -> &mut Self {
        self.key(field, WireType::LengthDelimited)
            .varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Append a string field
    pub fn string_field(&mut self, field: u32, value: &str) -> &mut Self {
        self.bytes_field(field, value.as_bytes())
    }

    /// Append an embedded message field
    pub fn message_field(&mut self, field: u32, message: &ProtoWriter) -> &mut Self {
        self.bytes_field(field, &message.buf)
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
