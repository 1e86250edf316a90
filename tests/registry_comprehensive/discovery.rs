//! Discovery, lookup and run lifecycle

use super::*;
use runscope::Error;

#[test]
fn test_discover_is_idempotent() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-aaa")
        .log(&[encode::history(&[("_step", "0"), ("loss", "1.0")])])
        .config_yaml("lr:\n  value: 0.1\n");
    RunFixture::new(root.path(), "offline-run-20240102_000000-bbb")
        .summary_json(r#"{"loss": 0.2}"#);

    let registry = open(&root);
    let first = registry.discover().unwrap();
    let second = registry.discover().unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_discover_orders_newest_first_and_ignores_other_dirs() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20230101_000000-old");
    RunFixture::new(root.path(), "run-20240101_000000-new");
    RunFixture::new(root.path(), "run-20241399_999999-bad");
    fs::create_dir_all(root.path().join("latest-run")).unwrap();
    fs::write(root.path().join("debug.log"), "x").unwrap();

    let runs = open(&root).discover().unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old", "bad"]);
    assert!(runs[2].created_at.is_none());
}

#[test]
fn test_run_without_log_is_kept() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "offline-run-20240101_000000-nolog")
        .summary_json(r#"{"acc": 0.9}"#);

    let registry = open(&root);
    let run = registry.get("nolog").unwrap();
    assert!(run.is_offline);
    assert!(run.log_file_path.is_none());
    assert_eq!(run.display_name, "nolog");
    assert_eq!(run.summary, Some(map(r#"{"acc": 0.9}"#)));
    assert!(registry.history("nolog", false).unwrap().is_empty());
}

#[test]
fn test_duplicate_id_keeps_newest_directory() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-dup").summary_json(r#"{"v": 1}"#);
    RunFixture::new(root.path(), "offline-run-20240301_000000-dup").summary_json(r#"{"v": 2}"#);

    let runs = open(&root).discover().unwrap();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].is_offline);
    assert_eq!(runs[0].summary, Some(map(r#"{"v": 2}"#)));
}

#[test]
fn test_newer_duplicate_rebuilds_from_its_own_log() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20230101_000000-dup")
        .log(&[encode::run("dup", "old-name", &[("a", "1")], &[])]);

    let registry = open(&root);
    let first = registry.get("dup").unwrap();
    assert_eq!(first.display_name, "old-name");

    let newer = RunFixture::new(root.path(), "offline-run-20240101_000000-dup");
    newer.log(&[
        encode::run("dup", "new-name", &[("a", "2")], &[]),
        encode::history(&[("loss", "0.5")]),
    ]);

    let runs = registry.discover().unwrap();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.directory, newer.dir);
    assert_eq!(run.log_file_path, Some(newer.log_path()));
    assert_eq!(run.display_name, "new-name");
    assert_eq!(run.config, map(r#"{"a": 2}"#));

    let history = registry.history("dup", false).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].get("loss"), Some(&Value::Float(0.5)));
}

#[test]
fn test_get_rediscovers_new_runs() {
    let root = TempDir::new().unwrap();
    let registry = open(&root);
    assert!(registry.discover().unwrap().is_empty());

    RunFixture::new(root.path(), "run-20240101_000000-late");
    assert_eq!(registry.get("late").unwrap().id.as_str(), "late");
}

#[test]
fn test_missing_run_is_not_found() {
    let root = TempDir::new().unwrap();
    let registry = open(&root);
    let err = registry.get("missing").unwrap_err();
    assert!(err.is_not_found());
    assert!(registry.history("missing", false).unwrap_err().is_not_found());
    assert!(registry.metrics("missing", None).unwrap_err().is_not_found());
}

#[test]
fn test_open_rejects_missing_root() {
    let root = TempDir::new().unwrap();
    let err = RunRegistry::open(root.path().join("nope")).err().unwrap();
    assert!(matches!(err, Error::InvalidRoot(_)));
}

#[test]
fn test_media_sorted_by_epoch() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-vid")
        .media("nomatch.gif")
        .media("epoch10_y.gif")
        .media("sub/epoch2_x.gif")
        .media("notes.txt");

    let registry = open(&root);
    assert!(registry.get("vid").unwrap().has_media);

    let media = registry.media("vid").unwrap();
    let names: Vec<_> = media.iter().map(|m| m.filename.as_str()).collect();
    assert_eq!(names, vec!["epoch2_x.gif", "epoch10_y.gif", "nomatch.gif"]);
    assert_eq!(media[0].relative_path, PathBuf::from("media/sub/epoch2_x.gif"));
}

#[test]
fn test_delete_requires_read_write() {
    let root = TempDir::new().unwrap();
    let fixture = RunFixture::new(root.path(), "run-20240101_000000-gone");

    let err = open(&root).delete_run("gone").unwrap_err();
    assert!(matches!(err, Error::ReadOnly(_)));
    assert!(fixture.dir.exists());

    let registry = RunRegistry::builder()
        .root(root.path())
        .read_write()
        .open()
        .unwrap();
    registry.delete_run("gone").unwrap();
    assert!(!fixture.dir.exists());
    assert!(registry.get("gone").unwrap_err().is_not_found());
}

#[test]
fn test_config_keys_across_runs() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-one")
        .config_yaml("lr:\n  value: 0.1\noptim:\n  value:\n    name: adam\n");
    RunFixture::new(root.path(), "run-20240102_000000-two")
        .config_yaml("seed:\n  value: 3\n_wandb:\n  value:\n    cli_version: 0.16.0\n");

    let keys = open(&root).config_keys().unwrap();
    assert_eq!(keys, vec!["lr", "optim.name", "seed"]);
}
