use std::fs;
use std::path::Path;

use lambda_meta::enumerate::{scan, EnumerateError};
use serde_json::json;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("fixture should be written");
}

fn fixtures() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "simple_result.json",
        r#"{
            "name": "simpleResult",
            "description": "Sample method that returns a literal.",
            "events": [{"http": {"path": "simple-result", "method": "get"}}]
        }"#,
    );
    write(
        dir.path(),
        "schedule.json",
        r#"{"name": "schedule", "events": [{"schedule": "cron(*/5 * * * ? *)"}]}"#,
    );
    write(
        dir.path(),
        "custom_options.json",
        r#"{"name": "customOptions", "timeout": 30, "memorySize": 256, "warmup": true,
            "inputs": {"num": {"type": "Number", "required": true}}}"#,
    );
    fs::create_dir(dir.path().join("nested.json")).expect("directory fixture");
    dir
}

#[test]
fn enumerates_descriptor_files() {
    let dir = fixtures();
    let pattern = format!("{}/*.json", dir.path().display());
    let functions = scan(&pattern, "").expect("scan should succeed");

    assert_eq!(functions.len(), 3);

    let simple = serde_json::to_value(&functions["simpleResult"]).expect("serializes");
    assert_eq!(simple["events"][0]["http"]["path"], json!("simple-result"));
    assert_eq!(simple["events"][0]["http"]["method"], json!("get"));
    assert!(simple["handler"]
        .as_str()
        .is_some_and(|handler| handler.ends_with("simple_result.entry")));

    assert_eq!(
        functions["schedule"].events[0]["schedule"],
        json!("cron(*/5 * * * ? *)")
    );

    let custom = serde_json::to_value(&functions["customOptions"]).expect("serializes");
    assert_eq!(custom["memorySize"], json!(256));
    assert_eq!(custom["timeout"], json!(30));
    assert_eq!(custom["warmup"], json!(true));
    assert_eq!(custom["inputs"]["num"], json!({"type": "Number", "required": true}));
}

#[test]
fn prefixes_function_names() {
    let dir = fixtures();
    let pattern = format!("{}/schedule.json", dir.path().display());
    let functions = scan(&pattern, "dev-").expect("scan should succeed");
    assert!(functions.contains_key("dev-schedule"));
}

#[test]
fn malformed_descriptors_name_the_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "broken.json", "{ not json");
    let pattern = format!("{}/*.json", dir.path().display());

    let err = scan(&pattern, "").unwrap_err();
    assert!(matches!(err, EnumerateError::Parse { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn empty_matches_produce_no_functions() {
    let dir = tempfile::tempdir().expect("temp dir");
    let pattern = format!("{}/*.json", dir.path().display());
    assert!(scan(&pattern, "").expect("scan").is_empty());
}
