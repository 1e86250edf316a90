//! Fragment reassembly
//!
//! [`ChunkReader`] walks the block structure and yields one [`Chunk`] per
//! logical chunk. Damage never stops the walk except at end of file:
//! a bad checksum or an out-of-order fragment produces a [`Chunk::Corrupt`]
//! and the reader moves on, while a fragment cut off by end of file ends the
//! walk and sets [`ChunkReader::truncated_tail`].

use std::fmt;

use crate::format::{
    fragment_checksum, FragmentHeader, FragmentType, BLOCK_LEN, FRAGMENT_HEADER_LEN,
};

/// Why a chunk was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptReason {
    /// Stored checksum does not match the payload
    ChecksumMismatch {
        /// Offset of the fragment header
        offset: usize,
    },
    /// Fragment length runs past the end of its block
    LengthOverflow {
        /// Offset of the fragment header
        offset: usize,
    },
    /// Fragment type byte is not a known type
    UnknownType {
        /// Offset of the fragment header
        offset: usize,
        /// Raw type byte
        kind: u8,
    },
    /// Fragment arrived out of sequence (e.g. MIDDLE without FIRST)
    UnexpectedFragment {
        /// Offset of the fragment header
        offset: usize,
    },
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptReason::ChecksumMismatch { offset } => {
                write!(f, "checksum mismatch at offset {}", offset)
            }
            CorruptReason::LengthOverflow { offset } => {
                write!(f, "fragment length overflows block at offset {}", offset)
            }
            CorruptReason::UnknownType { offset, kind } => {
                write!(f, "unknown fragment type {} at offset {}", kind, offset)
            }
            CorruptReason::UnexpectedFragment { offset } => {
                write!(f, "fragment out of sequence at offset {}", offset)
            }
        }
    }
}

/// One logical chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Reassembled payload
    Data(Vec<u8>),
    /// Dropped chunk
    Corrupt(CorruptReason),
}

/// Iterator over the chunks of a block log body
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    verify_checksums: bool,
    truncated_tail: bool,
}

impl<'a> ChunkReader<'a> {
    /// Start reading at `start`, an absolute offset into `data`
    ///
    /// `data` must be the whole file so that block boundaries line up.
    pub fn new(data: &'a [u8], start: usize, verify_checksums: bool) -> Self {
        ChunkReader {
            data,
            pos: start,
            verify_checksums,
            truncated_tail: false,
        }
    }

    /// Whether the walk ended inside a fragment or a multi-fragment chunk
    pub fn truncated_tail(&self) -> bool {
        self.truncated_tail
    }

    /// Current absolute offset
    pub fn position(&self) -> usize {
        self.pos
    }

    fn block_remaining(&self) -> usize {
        BLOCK_LEN - self.pos % BLOCK_LEN
    }

    fn stop(&mut self, truncated: bool) -> Option<Chunk> {
        self.truncated_tail |= truncated;
        self.pos = self.data.len();
        None
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let mut partial: Option<Vec<u8>> = None;

        loop {
            let remaining = self.block_remaining();
            if remaining < FRAGMENT_HEADER_LEN {
                // Block trailer
                self.pos += remaining;
            }
            if self.pos >= self.data.len() {
                return self.stop(partial.is_some());
            }

            let start = self.pos;
            let remaining = self.block_remaining();
            if start + FRAGMENT_HEADER_LEN > self.data.len() {
                return self.stop(true);
            }
            let header = FragmentHeader::parse(&self.data[start..start + FRAGMENT_HEADER_LEN]);
            let length = header.length as usize;

            if header.kind == 0 && length == 0 {
                // Zeroed space the producer has not written yet
                self.pos += remaining;
                continue;
            }
            if FRAGMENT_HEADER_LEN + length > remaining {
                self.pos += remaining;
                return Some(Chunk::Corrupt(CorruptReason::LengthOverflow { offset: start }));
            }
            let end = start + FRAGMENT_HEADER_LEN + length;
            if end > self.data.len() {
                return self.stop(true);
            }
            let payload = &self.data[start + FRAGMENT_HEADER_LEN..end];

            let Some(kind) = FragmentType::from_byte(header.kind) else {
                self.pos = end;
                return Some(Chunk::Corrupt(CorruptReason::UnknownType {
                    offset: start,
                    kind: header.kind,
                }));
            };

            if self.verify_checksums && fragment_checksum(header.kind, payload) != header.checksum {
                self.pos = end;
                return Some(Chunk::Corrupt(CorruptReason::ChecksumMismatch { offset: start }));
            }

            match (kind, partial.as_mut()) {
                (FragmentType::Full, None) => {
                    self.pos = end;
                    return Some(Chunk::Data(payload.to_vec()));
                }
                (FragmentType::First, None) => {
                    self.pos = end;
                    partial = Some(payload.to_vec());
                }
                (FragmentType::Middle, Some(buf)) => {
                    self.pos = end;
                    buf.extend_from_slice(payload);
                }
                (FragmentType::Last, Some(buf)) => {
                    self.pos = end;
                    buf.extend_from_slice(payload);
                    return Some(Chunk::Data(std::mem::take(buf)));
                }
                (FragmentType::Full | FragmentType::First, Some(_)) => {
                    // The open chunk was never closed; drop it and reread this
                    // fragment as the start of the next chunk.
                    return Some(Chunk::Corrupt(CorruptReason::UnexpectedFragment {
                        offset: start,
                    }));
                }
                (FragmentType::Middle | FragmentType::Last | FragmentType::Zero, _) => {
                    self.pos = end;
                    return Some(Chunk::Corrupt(CorruptReason::UnexpectedFragment {
                        offset: start,
                    }));
                }
            }
        }
    }
}
