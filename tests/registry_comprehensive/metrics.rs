//! History projection through the registry

use super::*;

#[test]
fn test_projection_of_sparse_history() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-met").log(&[
        encode::history(&[("_step", "0"), ("loss", "1.0")]),
        encode::history(&[("_step", "1"), ("loss", "0.5"), ("acc", "0.9")]),
    ]);

    let series = open(&root).metrics("met", None).unwrap();
    let keys: Vec<_> = series.keys().collect();
    assert_eq!(keys, vec!["_step", "acc", "loss"]);
    assert_eq!(series.get("_step").unwrap(), &[Value::Int(0), Value::Int(1)]);
    assert_eq!(
        series.get("loss").unwrap(),
        &[Value::Float(1.0), Value::Float(0.5)]
    );
    assert_eq!(series.get("acc").unwrap(), &[Value::Null, Value::Float(0.9)]);
}

#[test]
fn test_requested_keys_and_axes() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-met").log(&[
        encode::history(&[("loss", "1.0"), ("_runtime", "1.5"), ("note", "\"hi\"")]),
        encode::history(&[("loss", "0.5"), ("_runtime", "3.0"), ("note", "\"yo\"")]),
    ]);

    let requested = vec!["loss".to_string(), "note".to_string()];
    let series = open(&root).metrics("met", Some(&requested)).unwrap();
    let keys: Vec<_> = series.keys().collect();
    assert_eq!(keys, vec!["_runtime", "_step", "loss", "note"]);
    assert_eq!(series.get("_step").unwrap(), &[Value::Int(0), Value::Int(1)]);
    assert_eq!(series.get("note").unwrap(), &[Value::Null, Value::Null]);
}

#[test]
fn test_available_metrics() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-met").log(&[encode::history(&[
        ("_step", "0"),
        ("_timestamp", "1700000000.5"),
        ("_internal", "1"),
        ("loss", "1.0"),
        ("tag", "\"x\""),
        ("done", "true"),
    ])]);

    let keys = open(&root).available_metrics("met").unwrap();
    assert_eq!(keys, vec!["_step", "_timestamp", "loss"]);
}

#[test]
fn test_metrics_of_run_without_history() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-empty").log(&[]);

    let registry = open(&root);
    assert!(registry.metrics("empty", None).unwrap().is_empty());
    assert!(registry.available_metrics("empty").unwrap().is_empty());
}
