//! History caching keyed on the log's modification time

use super::*;

#[test]
fn test_history_follows_log_mtime() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-hist");
    fixture.log(&[encode::history(&[("loss", "1.0")])]);
    fixture.set_log_mtime(1_000);

    let registry = open(&root);
    assert_eq!(registry.history("hist", false).unwrap().len(), 1);
    assert!(registry.is_history_cached("hist"));

    // Same mtime: cached rows are served even though the content changed
    fixture.log(&[
        encode::history(&[("loss", "1.0")]),
        encode::history(&[("loss", "0.5")]),
    ]);
    fixture.set_log_mtime(1_000);
    assert_eq!(registry.history("hist", false).unwrap().len(), 1);

    fixture.set_log_mtime(2_000);
    let rows = registry.history("hist", false).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("loss"), Some(&Value::Float(0.5)));
}

#[test]
fn test_force_rereads() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-hist");
    fixture.log(&[encode::history(&[("loss", "1.0")])]);
    fixture.set_log_mtime(1_000);

    let registry = open(&root);
    assert_eq!(registry.history("hist", false).unwrap().len(), 1);

    fixture.log(&[
        encode::history(&[("loss", "1.0")]),
        encode::history(&[("loss", "0.5")]),
    ]);
    fixture.set_log_mtime(1_000);
    assert_eq!(registry.history("hist", true).unwrap().len(), 2);
}

#[test]
fn test_clear_cache_drops_everything() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-hist")
        .log(&[encode::history(&[("loss", "1.0")])]);

    let registry = open(&root);
    registry.history("hist", false).unwrap();
    assert_eq!(registry.cached_run_count(), 1);

    registry.clear_cache();
    assert_eq!(registry.cached_run_count(), 0);
    assert!(!registry.is_history_cached("hist"));

    assert_eq!(registry.refresh().unwrap(), 1);
}
