//! File and environment layering

use std::path::PathBuf;
use verdict_utils::{AppConfig, ConfigError};

fn write_config(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("verdict-{}-{name}.json", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn file_values_sit_under_environment() {
    let path = write_config(
        "layered",
        r#"{
            "model": {"model": "file-model", "requests_per_minute": 10},
            "analysis": {"max_iterations": 6},
            "event_buffer": 16
        }"#,
    );

    let from_file = AppConfig::from_file(&path).unwrap();
    assert_eq!(from_file.model.model, "file-model");
    assert_eq!(from_file.model.max_tokens, 4096);
    assert_eq!(from_file.analysis.max_iterations, 6);
    assert_eq!(from_file.analysis.price_period, "1mo");

    let layered = from_file
        .apply_env(|key| (key == "VERDICT_MAX_ITERATIONS").then(|| "3".to_string()))
        .unwrap();
    assert_eq!(layered.analysis.max_iterations, 3);
    assert_eq!(layered.event_buffer, 16);
    assert!(layered.validate().is_ok());

    std::fs::remove_file(path).unwrap();
}

#[test]
fn malformed_file_names_the_path() {
    let path = write_config("broken", "{ not json");
    let err = AppConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("verdict-"));
    std::fs::remove_file(path).unwrap();
}

#[test]
fn missing_file_is_a_read_error() {
    let err = AppConfig::from_file(std::path::Path::new("/nonexistent/verdict.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
