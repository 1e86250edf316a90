//! Reader for `.wandb` record logs
//!
//! A record log is an append-only block log of protobuf `Record` messages.
//! This crate decodes it without generated code and without ever failing on
//! damage past the file header:
//!
//! - [`format`]: file header and fragment layout
//! - [`chunk`]: fragment reassembly into logical chunks
//! - [`proto`]: protobuf wire decoding
//! - [`record`]: the record kinds the registry uses
//! - [`reader`]: [`RecordLogReader`], folding records into [`LogContents`]
//!
//! With the `test-utils` feature, `writer` builds byte-exact fixture logs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod error;
pub mod format;
pub mod proto;
pub mod reader;
pub mod record;

#[cfg(any(test, feature = "test-utils"))]
pub mod writer;

pub use chunk::{Chunk, ChunkReader, CorruptReason};
pub use error::{LogError, LogResult};
pub use reader::{LogContents, RecordLogReader, ScanOptions, ScanStats};
pub use record::{decode_record, HistoryRecord, Record, RunRecord, UpdateItem, UpdateRecord};

#[cfg(any(test, feature = "test-utils"))]
pub use writer::{encode, LogWriter};
