//! Record log reader
//!
//! Reads a whole `.wandb` file and folds its records into history rows plus
//! the accumulated run, summary and config state.
//!
//! ## Degradation
//!
//! A missing file is [`Outcome::Absent`] and an unreadable file header is
//! [`Outcome::Degraded`]. Past the header nothing fails: corrupt and
//! malformed chunks are skipped and counted in [`ScanStats`], and a torn tail
//! ends the scan with whatever was read before it.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use runscope_core::{HistoryRow, Map, Outcome};
use tracing::{debug, warn};

use crate::chunk::{Chunk, ChunkReader};
use crate::error::LogResult;
use crate::format::{check_file_header, FILE_HEADER_LEN};
use crate::record::{apply_updates, decode_record, Record, RunRecord};

// ============================================================================
// Options
// ============================================================================

/// Options for scanning a record log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Drop fragments whose CRC does not match (default: true)
    pub verify_checksums: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            verify_checksums: true,
        }
    }
}

impl ScanOptions {
    /// Verify every checksum
    pub fn strict() -> Self {
        Self::default()
    }

    /// Trust fragment payloads without checking CRCs
    pub fn lenient() -> Self {
        ScanOptions {
            verify_checksums: false,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Counters collected during one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Logical chunks reassembled, header chunk included
    pub chunks: usize,
    /// Chunks decoded as a used record kind
    pub records: usize,
    /// Well-formed records of an unused kind
    pub unknown_records: usize,
    /// Chunks whose payload failed to decode
    pub malformed_records: usize,
    /// Chunks dropped by framing (checksum, sequence, length)
    pub corrupt_chunks: usize,
    /// Scan ended inside an incomplete fragment or chunk
    pub truncated_tail: bool,
}

impl ScanStats {
    /// Any chunk dropped or tail cut off
    pub fn has_issues(&self) -> bool {
        self.malformed_records > 0 || self.corrupt_chunks > 0 || self.truncated_tail
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{} chunks, {} records, {} unknown, {} malformed, {} corrupt{}",
            self.chunks,
            self.records,
            self.unknown_records,
            self.malformed_records,
            self.corrupt_chunks,
            if self.truncated_tail {
                ", truncated tail"
            } else {
                ""
            }
        )
    }
}

/// Everything recovered from one record log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContents {
    /// Run record, if the log has one
    pub run: Option<RunRecord>,
    /// History rows in log order
    pub history: Vec<HistoryRow>,
    /// Summary built from run-inline and standalone summary records
    pub summary: Map,
    /// Config built from run-inline and standalone config records
    pub config: Map,
    /// Scan counters
    pub stats: ScanStats,
}

impl LogContents {
    fn apply(&mut self, record: Record) {
        match record {
            Record::Run(run) => {
                apply_updates(&mut self.config, &run.config_updates);
                apply_updates(&mut self.summary, &run.summary_updates);
                match self.run.as_mut() {
                    Some(existing) => existing.merge(run),
                    None => self.run = Some(run),
                }
            }
            Record::History(history) => self.history.push(history.row),
            Record::Summary(update) => update.apply_to(&mut self.summary),
            Record::Config(update) => update.apply_to(&mut self.config),
            Record::Unknown => {}
        }
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Decoder for `.wandb` record logs
#[derive(Debug, Clone, Default)]
pub struct RecordLogReader {
    options: ScanOptions,
}

impl RecordLogReader {
    /// Create a reader with the given options
    pub fn new(options: ScanOptions) -> Self {
        RecordLogReader { options }
    }

    /// Options in effect
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Read a log file
    pub fn read(&self, path: &Path) -> Outcome<LogContents> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Outcome::Absent,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Record log unreadable");
                return Outcome::degraded(e.to_string());
            }
        };

        match self.read_from_slice(&bytes) {
            Ok(contents) => {
                if contents.stats.has_issues() {
                    warn!(
                        path = %path.display(),
                        "Record log damaged: {}",
                        contents.stats.summary()
                    );
                }
                Outcome::Loaded(contents)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Record log degraded");
                Outcome::degraded(e.to_string())
            }
        }
    }

    /// Read a log from any reader
    pub fn read_from<R: Read>(&self, mut reader: R) -> LogResult<LogContents> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.read_from_slice(&bytes)
    }

    /// Read a log held in memory
    ///
    /// Fails only when the file header is bad.
    pub fn read_from_slice(&self, bytes: &[u8]) -> LogResult<LogContents> {
        check_file_header(bytes)?;

        let mut contents = LogContents::default();
        let mut chunks = ChunkReader::new(bytes, FILE_HEADER_LEN, self.options.verify_checksums);
        let mut header_skipped = false;

        for chunk in chunks.by_ref() {
            let payload = match chunk {
                Chunk::Data(payload) => payload,
                Chunk::Corrupt(reason) => {
                    debug!(%reason, "Skipping corrupt chunk");
                    contents.stats.corrupt_chunks += 1;
                    header_skipped = true;
                    continue;
                }
            };
            contents.stats.chunks += 1;

            // First chunk is the header record
            if !header_skipped {
                header_skipped = true;
                continue;
            }

            match decode_record(&payload) {
                Ok(Record::Unknown) => contents.stats.unknown_records += 1,
                Ok(record) => {
                    contents.stats.records += 1;
                    contents.apply(record);
                }
                Err(e) => {
                    debug!(error = %e, len = payload.len(), "Skipping malformed record");
                    contents.stats.malformed_records += 1;
                }
            }
        }

        contents.stats.truncated_tail = chunks.truncated_tail();
        Ok(contents)
    }
}
