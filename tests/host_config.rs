use bootguard::{ConfigError, RecoveryConfig};
use std::fs;
use std::path::PathBuf;

#[test]
fn defaults_match_the_shipped_policy() {
    let config = RecoveryConfig::default();
    assert_eq!(config.audit_max_bytes, 50 * 1024);
    assert_eq!(config.audit_min_retained, 5);
    assert_eq!(config.boot_failure_threshold, 3);
    assert_eq!(config.settle_delay_ms, 2_000);

    let policy = config.retention_policy();
    assert_eq!(policy.max_bytes, 50 * 1024);
    assert_eq!(policy.min_retained, 5);
}

#[test]
fn partial_file_falls_back_to_defaults_per_field() {
    let dir = tempfile::tempdir().expect("tempdir created");
    let path = dir.path().join("bootguard.json");
    fs::write(
        &path,
        r#"{"audit_max_bytes": 1024, "counter_store_path": "/var/lib/node/boot_record.json"}"#,
    )
    .expect("config written");

    let config = RecoveryConfig::load(&path).expect("config loads");
    assert_eq!(config.audit_max_bytes, 1024);
    assert_eq!(
        config.counter_store_path,
        PathBuf::from("/var/lib/node/boot_record.json")
    );
    assert_eq!(config.boot_failure_threshold, 3);
    assert_eq!(config.audit_min_retained, 5);
}

#[test]
fn malformed_file_reports_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir created");
    let path = dir.path().join("bootguard.json");
    fs::write(&path, "{ nope").expect("config written");

    match RecoveryConfig::load(&path) {
        Err(ConfigError::Parse { .. }) => {}
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_file_reports_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir created");
    match RecoveryConfig::load(&dir.path().join("absent.json")) {
        Err(ConfigError::Read { .. }) => {}
        other => panic!("expected read error, got {other:?}"),
    }
}
