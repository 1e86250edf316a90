//! Damaged logs never fail a registry call

use super::*;
use runscope::{RecordLogReader, ScanOptions};

fn rows(registry: &RunRegistry, id: &str) -> Vec<Value> {
    registry
        .history(id, false)
        .unwrap()
        .iter()
        .map(|row| row.get("loss").cloned().unwrap_or(Value::Null))
        .collect()
}

#[test]
fn test_unparsable_chunk_between_valid_rows() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-sand");

    let mut writer = LogWriter::new();
    writer.append_record(&encode::history(&[("loss", "1.0")]));
    writer.append_chunk(&[0xFF, 0xFF, 0xFF]);
    writer.append_record(&encode::history(&[("loss", "0.5")]));
    fixture.log_bytes(writer.as_bytes());

    let registry = open(&root);
    assert_eq!(rows(&registry, "sand"), vec![Value::Float(1.0), Value::Float(0.5)]);

    let contents = RecordLogReader::default()
        .read(&fixture.log_path())
        .loaded()
        .unwrap();
    assert_eq!(contents.stats.malformed_records, 1);
}

#[test]
fn test_checksum_damage_between_valid_rows() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-crc");

    let mut writer = LogWriter::new();
    writer.append_record(&encode::history(&[("loss", "1.0")]));
    let middle = encode::history(&[("loss", "7.0")]);
    let offset = writer.append_record(&middle);
    writer.append_record(&encode::history(&[("loss", "0.5")]));
    let mut bytes = writer.into_bytes();
    // Last payload byte is the final digit of "7.0"; flipping it keeps the record decodable
    bytes[offset + 7 + middle.len() - 1] ^= 0x01;
    fixture.log_bytes(&bytes);

    let registry = open(&root);
    assert_eq!(rows(&registry, "crc"), vec![Value::Float(1.0), Value::Float(0.5)]);

    let lenient = RunRegistry::builder()
        .root(root.path())
        .scan_options(ScanOptions::lenient())
        .open()
        .unwrap();
    assert_eq!(lenient.history("crc", false).unwrap().len(), 3);
}

#[test]
fn test_truncated_tail_keeps_prefix() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-torn");

    let mut writer = LogWriter::new();
    writer.append_record(&encode::history(&[("loss", "1.0")]));
    writer.append_record(&encode::history(&[("loss", "0.5")]));
    let bytes = writer.into_bytes();
    fixture.log_bytes(&bytes[..bytes.len() - 3]);

    assert_eq!(rows(&open(&root), "torn"), vec![Value::Float(1.0)]);
}

#[test]
fn test_bad_file_header_still_lists_run() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-junk")
        .log_bytes(b"not a record log at all")
        .summary_json(r#"{"loss": 0.3}"#);

    let registry = open(&root);
    let run = registry.get("junk").unwrap();
    assert_eq!(run.summary, Some(map(r#"{"loss": 0.3}"#)));
    assert!(registry.history("junk", false).unwrap().is_empty());
}

#[test]
fn test_record_spanning_blocks() {
    let root = TempDir::new().unwrap();
    let long = format!("\"{}\"", "x".repeat(70_000));
    RunFixture::new(root.path(), "run-20240101_000000-big").log(&[
        encode::history(&[("loss", "1.0"), ("blob", long.as_str())]),
        encode::history(&[("loss", "0.5")]),
    ]);

    assert_eq!(
        rows(&open(&root), "big"),
        vec![Value::Float(1.0), Value::Float(0.5)]
    );
}

mod garbage_tail {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn trailing_garbage_keeps_complete_rows(tail in proptest::collection::vec(any::<u8>(), 0..512)) {
            let root = TempDir::new().unwrap();
            let fixture = RunFixture::new(root.path(), "run-20240101_000000-tail");

            let mut writer = LogWriter::new();
            writer.append_record(&encode::history(&[("loss", "1.0")]));
            let mut bytes = writer.into_bytes();
            bytes.extend_from_slice(&tail);
            fixture.log_bytes(&bytes);

            let history = open(&root).history("tail", false).unwrap();
            prop_assert!(!history.is_empty());
            prop_assert_eq!(history[0].get("loss"), Some(&Value::Float(1.0)));
        }
    }
}
