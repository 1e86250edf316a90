//! Fixture log writer
//!
//! Produces byte-exact `.wandb` files for tests: the same file header, block
//! layout, fragment splitting and checksums the producer uses. Not meant for
//! writing real logs.

use std::fs;
use std::io;
use std::path::Path;

use crate::format::{
    file_header, fragment_checksum, FragmentHeader, FragmentType, BLOCK_LEN, FRAGMENT_HEADER_LEN,
};

/// In-memory log builder
#[derive(Debug, Clone)]
pub struct LogWriter {
    buf: Vec<u8>,
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogWriter {
    /// File header followed by the header record, like a fresh producer log
    pub fn new() -> Self {
        let mut writer = Self::raw();
        writer.append_chunk(&encode::header());
        writer
    }

    /// File header only
    pub fn raw() -> Self {
        LogWriter {
            buf: file_header().to_vec(),
        }
    }

    /// Append one logical chunk, splitting it across blocks as needed
    ///
    /// Returns the offset of the chunk's first fragment header.
    pub fn append_chunk(&mut self, payload: &[u8]) -> usize {
        let mut rest = payload;
        let mut start = None;

        loop {
            let remaining = BLOCK_LEN - self.buf.len() % BLOCK_LEN;
            if remaining < FRAGMENT_HEADER_LEN {
                self.buf.resize(self.buf.len() + remaining, 0);
                continue;
            }

            let take = rest.len().min(remaining - FRAGMENT_HEADER_LEN);
            let is_first = start.is_none();
            let is_last = take == rest.len();
            let kind = match (is_first, is_last) {
                (true, true) => FragmentType::Full,
                (true, false) => FragmentType::First,
                (false, false) => FragmentType::Middle,
                (false, true) => FragmentType::Last,
            };

            start.get_or_insert(self.buf.len());
            self.append_fragment(kind, &rest[..take]);
            rest = &rest[take..];

            if is_last {
                return start.unwrap_or_default();
            }
        }
    }

    /// Append an encoded record
    pub fn append_record(&mut self, record: &[u8]) -> usize {
        self.append_chunk(record)
    }

    /// Append a single fragment with a correct checksum, without block handling
    pub fn append_fragment(&mut self, kind: FragmentType, payload: &[u8]) {
        let header = FragmentHeader {
            checksum: fragment_checksum(kind.as_byte(), payload),
            length: payload.len() as u16,
            kind: kind.as_byte(),
        };
        self.buf.extend_from_slice(&header.to_bytes());
        self.buf.extend_from_slice(payload);
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always false; the file header is written on construction
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write the log to `path`, replacing any existing file
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, &self.buf)
    }
}

/// Record encoders
///
/// Values are passed as the raw `value_json` text, exactly as the producer
/// stores them.
pub mod encode {
    use crate::proto::ProtoWriter;
    use crate::record::field;

    /// `Record { header: {} }`
    pub fn header() -> Vec<u8> {
        vec![0xAA, 0x01, 0x00]
    }

    /// Item with a top-level key
    pub fn item(key: &str, value_json: &str) -> ProtoWriter {
        let mut w = ProtoWriter::new();
        w.string_field(1, key).string_field(16, value_json);
        w
    }

    /// Item addressed by `nested_key`
    pub fn nested_item(path: &[&str], value_json: &str) -> ProtoWriter {
        let mut w = ProtoWriter::new();
        for segment in path {
            w.string_field(2, segment);
        }
        w.string_field(16, value_json);
        w
    }

    /// Wrap a sub-message as the given `Record` one-of member
    pub fn record(field: u32, body: &ProtoWriter) -> Vec<u8> {
        let mut w = ProtoWriter::new();
        w.message_field(field, body);
        w.into_bytes()
    }

    fn update_body(updates: &[(&str, &str)], removes: &[&str]) -> ProtoWriter {
        let mut body = ProtoWriter::new();
        for (key, value_json) in updates {
            body.message_field(1, &item(key, value_json));
        }
        for key in removes {
            body.message_field(2, &item(key, ""));
        }
        body
    }

    /// History record with one item per `(key, value_json)`
    pub fn history(items: &[(&str, &str)]) -> Vec<u8> {
        let mut body = ProtoWriter::new();
        for (key, value_json) in items {
            body.message_field(1, &item(key, value_json));
        }
        record(field::HISTORY, &body)
    }

    /// Standalone summary record
    pub fn summary(updates: &[(&str, &str)], removes: &[&str]) -> Vec<u8> {
        record(field::SUMMARY, &update_body(updates, removes))
    }

    /// Standalone config record
    pub fn config(updates: &[(&str, &str)], removes: &[&str]) -> Vec<u8> {
        record(field::CONFIG, &update_body(updates, removes))
    }

    /// Run record with inline config and summary
    pub fn run(
        run_id: &str,
        display_name: &str,
        config: &[(&str, &str)],
        summary: &[(&str, &str)],
    ) -> Vec<u8> {
        let mut body = ProtoWriter::new();
        body.string_field(1, run_id)
            .string_field(3, "project")
            .message_field(4, &update_body(config, &[]))
            .message_field(5, &update_body(summary, &[]));
        if !display_name.is_empty() {
            body.string_field(8, display_name);
        }
        record(field::RUN, &body)
    }
}
