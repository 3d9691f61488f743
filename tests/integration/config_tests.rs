use std::fs;

use clap::Parser;
use tempfile::tempdir;
use tunedupe::cli::{Cli, Commands};
use tunedupe::config::{Config, ConfigError, Overrides};
use tunedupe::duplicates::DetectMode;

// Only `env_overrides_file` sets TUNEDUPE_ variables, and only for keys no
// other test here asserts on.

#[test]
fn test_load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
io_threads = 8
recursive = false
default_mode = "both"

[fuzzy]
duration_tolerance_ms = 3000
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), &Overrides::default()).unwrap();

    assert_eq!(config.io_threads, 8);
    assert!(!config.recursive);
    assert_eq!(config.default_mode, DetectMode::Both);
    assert_eq!(config.fuzzy.duration_tolerance_ms, 3000);
    // Untouched keys keep their defaults
    assert!(config.dry_run);
    assert!(!config.fuzzy.merge_exact_groups);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load(Some(&dir.path().join("absent.toml")), &Overrides::default()).unwrap();

    assert_eq!(config.io_threads, 4);
    assert_eq!(config.default_mode, DetectMode::Exact);
    assert!(config.dry_run);
}

#[test]
fn test_overrides_beat_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 8\ndry_run = true\n").unwrap();

    let overrides = Overrides {
        io_threads: Some(2),
        dry_run: Some(false),
        ..Overrides::default()
    };
    let config = Config::load(Some(&path), &overrides).unwrap();

    assert_eq!(config.io_threads, 2);
    assert!(!config.dry_run);
}

#[test]
fn test_cli_flags_flow_into_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "default_mode = \"exact\"\n[fuzzy]\nmerge_exact_groups = false\n").unwrap();

    let cli = Cli::try_parse_from([
        "tunedupe",
        "find",
        "/music",
        "--fuzzy",
        "--merge-exact",
        "--apply",
        "-R",
    ])
    .unwrap();
    let Commands::Find(args) = cli.command else {
        panic!("Expected Find command");
    };
    let config = Config::load(Some(&path), &args.overrides()).unwrap();

    assert_eq!(config.default_mode, DetectMode::Fuzzy);
    assert!(config.fuzzy.merge_exact_groups);
    assert!(!config.dry_run);
    assert!(!config.recursive);
    assert!(!config.finder_config().walker_config.recursive);
}

#[test]
fn test_env_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "probe_timeout_secs = 30\n").unwrap();

    std::env::set_var("TUNEDUPE_PROBE_TIMEOUT_SECS", "7");
    std::env::set_var("TUNEDUPE_FUZZY__MATCH_MISSING_DURATION", "false");

    let config = Config::load(Some(&path), &Overrides::default());

    std::env::remove_var("TUNEDUPE_PROBE_TIMEOUT_SECS");
    std::env::remove_var("TUNEDUPE_FUZZY__MATCH_MISSING_DURATION");

    let config = config.unwrap();
    assert_eq!(config.probe_timeout_secs, 7);
    assert!(!config.fuzzy.match_missing_duration);
}

#[test]
fn test_invalid_value_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "io_threads = 0\n").unwrap();

    let err = Config::load(Some(&path), &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("io_threads"));
}

#[test]
fn test_malformed_file_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "default_mode = \"sometimes\"\n").unwrap();

    let err = Config::load(Some(&path), &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_write_example() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/tunedupe/config.toml");

    Config::write_example(&path).unwrap();
    assert!(path.exists());

    let config = Config::load(Some(&path), &Overrides::default()).unwrap();
    assert_eq!(config.io_threads, Config::default().io_threads);
    assert_eq!(config.default_mode, Config::default().default_mode);

    let err = Config::write_example(&path).unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyExists(_)));
}
