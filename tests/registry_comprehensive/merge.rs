//! Sidecar / record log merge rules

use super::*;

#[test]
fn test_sidecar_config_wins_binary_fills_gaps() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-cfg")
        .config_yaml("a:\n  value: 1\n")
        .log(&[encode::config(&[("a", "2"), ("b", "3")], &[])]);

    let run = open(&root).get("cfg").unwrap();
    assert_eq!(run.config, map(r#"{"a": 1, "b": 3}"#));
}

#[test]
fn test_empty_sidecar_config_adopts_binary() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-cfg")
        .config_yaml("")
        .log(&[encode::config(&[("a", "2"), ("b", "3")], &[])]);

    let run = open(&root).get("cfg").unwrap();
    assert_eq!(run.config, map(r#"{"a": 2, "b": 3}"#));
}

#[test]
fn test_summary_sidecar_then_binary() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-side")
        .summary_json(r#"{"loss": 0.1}"#)
        .log(&[encode::summary(&[("loss", "0.9")], &[])]);
    RunFixture::new(root.path(), "run-20240102_000000-bin")
        .log(&[encode::summary(&[("loss", "0.9"), ("acc", "0.5")], &["acc"])]);
    RunFixture::new(root.path(), "run-20240103_000000-none");

    let registry = open(&root);
    assert_eq!(
        registry.get("side").unwrap().summary,
        Some(map(r#"{"loss": 0.1}"#))
    );
    assert_eq!(
        registry.get("bin").unwrap().summary,
        Some(map(r#"{"loss": 0.9}"#))
    );
    assert_eq!(registry.get("none").unwrap().summary, None);
}

#[test]
fn test_malformed_sidecars_degrade_quietly() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-bad")
        .config_yaml("a: [unclosed\n")
        .summary_json("{not json")
        .metadata_json("[]")
        .log(&[encode::config(&[("b", "3")], &[])]);

    let run = open(&root).get("bad").unwrap();
    assert_eq!(run.config, map(r#"{"b": 3}"#));
    assert_eq!(run.summary, Some(Map::new()));
    assert!(run.metadata.is_none());
}

#[test]
fn test_args_fallback_nests_dotted_keys() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-args").metadata_json(
        r#"{"program": "/home/me/train.py",
            "args": ["task.reward.weight=0.5", "flag=true", "name=foo", "--verbose"]}"#,
    );

    let run = open(&root).get("args").unwrap();
    assert_eq!(
        run.config,
        map(r#"{"task": {"reward": {"weight": 0.5}}, "flag": true, "name": "foo"}"#)
    );
    assert_eq!(run.name, "train.py");
}

#[test]
fn test_args_ignored_when_config_present() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-args")
        .metadata_json(r#"{"args": ["lr=0.5"]}"#)
        .config_yaml("lr:\n  value: 0.1\n");

    let run = open(&root).get("args").unwrap();
    assert_eq!(run.config, map(r#"{"lr": 0.1}"#));
    assert_eq!(run.name, "args");
}

// =============================================================================
// Display name tiers, one fixture per tier
// =============================================================================

const EXPERIMENT_CONFIG: &str = "params:\n  value:\n    config:\n      full_experiment_name: exp-name\n";
const CLIP_CONFIG: &str = "env_kwargs:\n  value:\n    retarget_info:\n      clip: walk-clip\n";

#[test]
fn test_display_name_from_run_record() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-tier")
        .config_yaml(&format!("{}{}", EXPERIMENT_CONFIG, CLIP_CONFIG))
        .log(&[encode::run("tier", "record-name", &[], &[])]);

    assert_eq!(open(&root).get("tier").unwrap().display_name, "record-name");
}

#[test]
fn test_display_name_from_experiment_name() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-tier")
        .config_yaml(&format!("{}{}", EXPERIMENT_CONFIG, CLIP_CONFIG))
        .log(&[encode::run("tier", "tier", &[], &[])]);

    assert_eq!(open(&root).get("tier").unwrap().display_name, "exp-name");
}

#[test]
fn test_display_name_from_clip() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-tier").config_yaml(CLIP_CONFIG);

    assert_eq!(open(&root).get("tier").unwrap().display_name, "walk-clip");
}

#[test]
fn test_display_name_falls_back_to_id() {
    let root = TempDir::new().unwrap();
    RunFixture::new(root.path(), "run-20240101_000000-tier")
        .config_yaml("env_kwargs:\n  value:\n    retarget_info:\n      clip: ''\n");

    assert_eq!(open(&root).get("tier").unwrap().display_name, "tier");
}
