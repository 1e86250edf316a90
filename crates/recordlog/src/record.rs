//! Record types and decoding
//!
//! A chunk payload is one `Record` message. Its one-of discriminator selects
//! the variant; only run, history, summary and config records carry data the
//! reader uses. Everything else (header, telemetry, stats, output, ...)
//! decodes to [`Record::Unknown`].

use runscope_core::{insert_path, remove_path, HistoryRow, Map, Value};

use crate::error::LogResult;
use crate::proto::{expect_wire_type, WireReader, WireType};

/// `Record` one-of field numbers
pub mod field {
    /// HistoryRecord
    pub const HISTORY: u32 = 2;
    /// SummaryRecord
    pub const SUMMARY: u32 = 3;
    /// ConfigRecord
    pub const CONFIG: u32 = 5;
    /// RunRecord
    pub const RUN: u32 = 17;
    /// HeaderRecord (first chunk of every log)
    pub const HEADER: u32 = 21;
}

/// One `(key, value_json)` entry of a history, summary or config record
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItem {
    /// Top-level key; empty when `nested_key` is used instead
    pub key: String,
    /// Path segments for nested updates
    pub nested_key: Vec<String>,
    /// Value decoded one level from `value_json`
    pub value: Value,
}

impl UpdateItem {
    /// Path segments this item addresses
    pub fn path(&self) -> Vec<&str> {
        if !self.key.is_empty() {
            vec![self.key.as_str()]
        } else {
            self.nested_key.iter().map(String::as_str).collect()
        }
    }

    /// Single flat key: `key`, or the nested path joined with `.`
    pub fn flat_key(&self) -> String {
        if !self.key.is_empty() {
            self.key.clone()
        } else {
            self.nested_key.join(".")
        }
    }

    fn decode(buf: &[u8]) -> LogResult<Self> {
        let mut reader = WireReader::new(buf);
        let mut key = String::new();
        let mut nested_key = Vec::new();
        let mut value_json = String::new();
        while let Some((field, wire_type)) = reader.read_key()? {
            match field {
                1 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    key = reader.read_string()?;
                }
                2 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    nested_key.push(reader.read_string()?);
                }
                16 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    value_json = reader.read_string()?;
                }
                _ => reader.skip(wire_type)?,
            }
        }
        Ok(UpdateItem {
            key,
            nested_key,
            value: Value::from_json_lossy(&value_json),
        })
    }
}

/// Summary or config record: updates then removals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRecord {
    /// Keys written
    pub updates: Vec<UpdateItem>,
    /// Keys deleted
    pub removes: Vec<UpdateItem>,
}

impl UpdateRecord {
    fn decode(buf: &[u8]) -> LogResult<Self> {
        let mut reader = WireReader::new(buf);
        let mut record = UpdateRecord::default();
        while let Some((field, wire_type)) = reader.read_key()? {
            match field {
                1 | 2 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    let item = UpdateItem::decode(reader.read_bytes()?)?;
                    if field == 1 {
                        record.updates.push(item);
                    } else {
                        record.removes.push(item);
                    }
                }
                _ => reader.skip(wire_type)?,
            }
        }
        Ok(record)
    }

    /// Apply to a mapping, last write wins
    pub fn apply_to(&self, target: &mut Map) {
        apply_updates(target, &self.updates);
        for item in &self.removes {
            let path = item.path();
            if !path.is_empty() {
                remove_path(target, &path);
            }
        }
    }
}

/// Write each item at its path. An item whose nested path collides with a
/// scalar is stored under its flat dotted key instead.
pub fn apply_updates(target: &mut Map, items: &[UpdateItem]) {
    for item in items {
        let path = item.path();
        if path.is_empty() {
            continue;
        }
        if !insert_path(target, &path, item.value.clone()) {
            target.insert(item.flat_key(), item.value.clone());
        }
    }
}

/// Run identity plus inline config and summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunRecord {
    /// Producer-assigned run id
    pub run_id: String,
    /// Human-facing name, empty if unset
    pub display_name: String,
    /// Project name
    pub project: String,
    /// Entity (user or team)
    pub entity: String,
    /// Inline config entries
    pub config_updates: Vec<UpdateItem>,
    /// Inline summary entries
    pub summary_updates: Vec<UpdateItem>,
}

impl RunRecord {
    fn decode(buf: &[u8]) -> LogResult<Self> {
        let mut reader = WireReader::new(buf);
        let mut run = RunRecord::default();
        while let Some((field, wire_type)) = reader.read_key()? {
            match field {
                1 | 2 | 3 | 8 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    let text = reader.read_string()?;
                    match field {
                        1 => run.run_id = text,
                        2 => run.entity = text,
                        3 => run.project = text,
                        _ => run.display_name = text,
                    }
                }
                4 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    let config = UpdateRecord::decode(reader.read_bytes()?)?;
                    run.config_updates.extend(config.updates);
                }
                5 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    let summary = UpdateRecord::decode(reader.read_bytes()?)?;
                    run.summary_updates.extend(summary.updates);
                }
                _ => reader.skip(wire_type)?,
            }
        }
        Ok(run)
    }

    /// Fold a later run record into this one; non-empty fields overwrite
    pub fn merge(&mut self, later: RunRecord) {
        for (slot, value) in [
            (&mut self.run_id, later.run_id),
            (&mut self.display_name, later.display_name),
            (&mut self.project, later.project),
            (&mut self.entity, later.entity),
        ] {
            if !value.is_empty() {
                *slot = value;
            }
        }
        self.config_updates.extend(later.config_updates);
        self.summary_updates.extend(later.summary_updates);
    }
}

/// One logged step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRecord {
    /// Decoded row, in item order
    pub row: HistoryRow,
}

impl HistoryRecord {
    fn decode(buf: &[u8]) -> LogResult<Self> {
        let mut reader = WireReader::new(buf);
        let mut row = HistoryRow::new();
        while let Some((field, wire_type)) = reader.read_key()? {
            match field {
                1 => {
                    expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                    let item = UpdateItem::decode(reader.read_bytes()?)?;
                    let key = item.flat_key();
                    if !key.is_empty() {
                        row.insert(key, item.value);
                    }
                }
                _ => reader.skip(wire_type)?,
            }
        }
        Ok(HistoryRecord { row })
    }
}

/// Decoded chunk payload
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Run identity and inline config/summary
    Run(RunRecord),
    /// One history row
    History(HistoryRecord),
    /// Standalone summary update
    Summary(UpdateRecord),
    /// Standalone config update
    Config(UpdateRecord),
    /// Any other record kind
    Unknown,
}

impl Record {
    /// Variant name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Run(_) => "run",
            Record::History(_) => "history",
            Record::Summary(_) => "summary",
            Record::Config(_) => "config",
            Record::Unknown => "unknown",
        }
    }
}

/// Decode one chunk payload
///
/// Returns an error only for malformed wire data; well-formed records of a
/// kind the reader does not use come back as [`Record::Unknown`]. When the
/// one-of field appears more than once the last occurrence wins.
pub fn decode_record(buf: &[u8]) -> LogResult<Record> {
    let mut reader = WireReader::new(buf);
    let mut record = Record::Unknown;
    while let Some((field, wire_type)) = reader.read_key()? {
        match field {
            field::HISTORY | field::SUMMARY | field::CONFIG | field::RUN => {
                expect_wire_type(field, wire_type, WireType::LengthDelimited)?;
                let body = reader.read_bytes()?;
                record = match field {
                    field::HISTORY => Record::History(HistoryRecord::decode(body)?),
                    field::SUMMARY => Record::Summary(UpdateRecord::decode(body)?),
                    field::CONFIG => Record::Config(UpdateRecord::decode(body)?),
                    _ => Record::Run(RunRecord::decode(body)?),
                };
            }
            _ => {
                reader.skip(wire_type)?;
                if wire_type == WireType::LengthDelimited && is_oneof_field(field) {
                    record = Record::Unknown;
                }
            }
        }
    }
    Ok(record)
}

/// Other one-of members of `Record`; seeing one after a used variant means
/// the later, unused variant is the one set.
fn is_oneof_field(field: u32) -> bool {
    matches!(field, 4 | 6..=13 | 18 | 20..=26 | 100..=102)
}
