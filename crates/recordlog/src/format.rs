//! Block log layout
//!
//! ```text
//! file   := header block*
//! header := ":W&B" magic:u16le version:u8
//! block  := fragment* padding       (32 KiB, fragments never straddle blocks)
//! fragment := crc:u32le len:u16le type:u8 payload[len]
//! ```
//!
//! Block boundaries are absolute file offsets, so the first block is shared
//! with the file header.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{LogError, LogResult};

/// File ident
pub const FILE_IDENT: &[u8; 4] = b":W&B";

/// File magic, stored little-endian after the ident
pub const FILE_MAGIC: u16 = 0xBEE1;

/// Only supported file version
pub const FILE_VERSION: u8 = 0;

/// Size of the file header
pub const FILE_HEADER_LEN: usize = 7;

/// Size of one block
pub const BLOCK_LEN: usize = 32 * 1024;

/// Size of one fragment header
pub const FRAGMENT_HEADER_LEN: usize = 7;

/// Fragment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentType {
    /// Preallocated zero bytes
    Zero,
    /// Whole chunk in one fragment
    Full,
    /// Opens a multi-fragment chunk
    First,
    /// Continues a multi-fragment chunk
    Middle,
    /// Closes a multi-fragment chunk
    Last,
}

impl FragmentType {
    /// Decode the type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(FragmentType::Zero),
            1 => Some(FragmentType::Full),
            2 => Some(FragmentType::First),
            3 => Some(FragmentType::Middle),
            4 => Some(FragmentType::Last),
            _ => None,
        }
    }

    /// Encode as the type byte
    pub fn as_byte(self) -> u8 {
        match self {
            FragmentType::Zero => 0,
            FragmentType::Full => 1,
            FragmentType::First => 2,
            FragmentType::Middle => 3,
            FragmentType::Last => 4,
        }
    }
}

/// Parsed fragment header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Stored checksum
    pub checksum: u32,
    /// Payload length
    pub length: u16,
    /// Raw type byte
    pub kind: u8,
}

impl FragmentHeader {
    /// Parse from exactly [`FRAGMENT_HEADER_LEN`] bytes
    pub fn parse(bytes: &[u8]) -> Self {
        FragmentHeader {
            checksum: LittleEndian::read_u32(&bytes[0..4]),
            length: LittleEndian::read_u16(&bytes[4..6]),
            kind: bytes[6],
        }
    }

    /// Serialize to header bytes
    pub fn to_bytes(&self) -> [u8; FRAGMENT_HEADER_LEN] {
        let mut out = [0u8; FRAGMENT_HEADER_LEN];
        LittleEndian::write_u32(&mut out[0..4], self.checksum);
        LittleEndian::write_u16(&mut out[4..6], self.length);
        out[6] = self.kind;
        out
    }
}

/// Fragment checksum: CRC-32 of the type byte, continued over the payload
pub fn fragment_checksum(kind: u8, payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(crc32fast::hash(&[kind]));
    hasher.update(payload);
    hasher.finalize()
}

/// Validate the file header
pub fn check_file_header(bytes: &[u8]) -> LogResult<()> {
    if bytes.len() < FILE_HEADER_LEN {
        return Err(LogError::BadHeader(format!(
            "file is {} bytes, shorter than the header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != FILE_IDENT {
        return Err(LogError::BadHeader("wrong ident".to_string()));
    }
    let magic = LittleEndian::read_u16(&bytes[4..6]);
    if magic != FILE_MAGIC {
        return Err(LogError::BadHeader(format!("wrong magic {:#06x}", magic)));
    }
    if bytes[6] != FILE_VERSION {
        return Err(LogError::BadHeader(format!(
            "unsupported version {}",
            bytes[6]
        )));
    }
    Ok(())
}

/// Encode the file header
pub fn file_header() -> [u8; FILE_HEADER_LEN] {
    let mut out = [0u8; FILE_HEADER_LEN];
    out[0..4].copy_from_slice(FILE_IDENT);
    LittleEndian::write_u16(&mut out[4..6], FILE_MAGIC);
    out[6] = FILE_VERSION;
    out
}
