mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn get_reportxl_cmd() -> Command {
    Command::cargo_bin("reportxl").unwrap()
}

const JOB: &str = r##"{
    "title": "Weekly Sales",
    "query": {
        "columns": ["region", "revenue"],
        "rows": [
            {"region": "North", "revenue": 1200.5},
            {"region": "South", "revenue": 980}
        ]
    },
    "columnConfig": [
        {"id": "c-region", "sourceColumn": "region", "displayName": "Region", "visible": true, "width": 12},
        {"id": "c-gone", "sourceColumn": "legacy", "displayName": "Legacy", "visible": true, "width": 8.43}
    ],
    "formatting": {
        "version": 2,
        "columnMap": {"c-region": 0},
        "snapshot": {"sheets": {"s1": {"cellData": {"0": {"0": {"s": {"bg": {"rgb": "#123456"}}}}}}}}
    }
}"##;

fn write_job(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("job.json");
    fs::write(&path, JOB).unwrap();
    path
}

#[test]
fn test_render_writes_dated_attachment_into_directory() {
    let temp_dir = TempDir::new().unwrap();
    let job = write_job(&temp_dir);
    let saved_config = temp_dir.path().join("config.json");

    get_reportxl_cmd()
        .arg("render")
        .arg(&job)
        .arg("--output")
        .arg(temp_dir.path())
        .args(["--date", "2025-01-31"])
        .arg("--save-config")
        .arg(&saved_config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly Sales_2025-01-31.xlsx"))
        .stdout(predicate::str::contains("(2 rows)"))
        .stderr(predicate::str::contains("Warning: Column \"Legacy\" (source: legacy) is no longer in the query results"))
        .stderr(predicate::str::contains("Warning: New column \"revenue\" added to config"));

    let bytes = fs::read(temp_dir.path().join("Weekly Sales_2025-01-31.xlsx")).unwrap();
    let styles = common::read_part(&bytes, "xl/styles.xml");
    assert!(styles.contains("<fgColor rgb=\"FF123456\"/>"));

    let config: serde_json::Value = serde_json::from_str(&fs::read_to_string(saved_config).unwrap()).unwrap();
    let ids: Vec<&str> = config.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(&ids[..2], &["c-region", "c-gone"]);
}

#[test]
fn test_render_to_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let job = write_job(&temp_dir);
    let target = temp_dir.path().join("out.xlsx");

    get_reportxl_cmd()
        .arg("render")
        .arg(&job)
        .arg("-o")
        .arg(&target)
        .assert()
        .success();

    let bytes = fs::read(&target).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_render_rejects_bad_date() {
    let temp_dir = TempDir::new().unwrap();
    let job = write_job(&temp_dir);

    get_reportxl_cmd()
        .arg("render")
        .arg(&job)
        .args(["--date", "31/01/2025"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"))
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_render_missing_job_is_user_error() {
    let temp_dir = TempDir::new().unwrap();

    get_reportxl_cmd()
        .arg("render")
        .arg(temp_dir.path().join("nope.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to load report job"));
}

#[test]
fn test_render_rejects_conflicting_template_positions() {
    let temp_dir = TempDir::new().unwrap();
    let job = temp_dir.path().join("job.json");
    fs::write(
        &job,
        r#"{"title": "t", "query": {"columns": ["a"], "rows": [{"a": 1}]},
            "columnConfig": [{"id": "x", "sourceColumn": "a", "displayName": "A", "visible": true, "width": 10}],
            "formatting": {"version": 2, "columnMap": {"x": 0, "y": 0}, "snapshot": {}}}"#,
    )
    .unwrap();

    get_reportxl_cmd()
        .arg("render")
        .arg(&job)
        .arg("-o")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("saved position 0 to both 'x' and 'y'"));
}

#[test]
fn test_generate_prints_config() {
    get_reportxl_cmd()
        .args(["generate", "employee_id", "firstName"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"displayName\": \"Employee Id\""))
        .stdout(predicate::str::contains("\"displayName\": \"First Name\""))
        .stdout(predicate::str::contains("\"sourceColumn\": \"firstName\""));
}

#[test]
fn test_reconcile_appends_new_columns() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(
        &config,
        r#"[{"id": "k1", "sourceColumn": "a", "displayName": "A", "visible": false, "width": 10}]"#,
    )
    .unwrap();
    let output = temp_dir.path().join("updated.json");

    get_reportxl_cmd()
        .arg("reconcile")
        .arg(&config)
        .args(["a", "b"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning: New column \"b\" added to config"));

    let updated: serde_json::Value = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
    let entries = updated.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], "k1");
    assert_eq!(entries[0]["visible"], false);
    assert_eq!(entries[1]["sourceColumn"], "b");
}

#[test]
fn test_migrate_widths_converts_pixels() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(
        &config,
        r#"[{"id": "k1", "sourceColumn": "a", "displayName": "A", "visible": true, "width": 140},
            {"id": "k2", "sourceColumn": "b", "displayName": "B", "visible": true, "width": 12}]"#,
    )
    .unwrap();

    get_reportxl_cmd()
        .arg("migrate-widths")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"width\": 20.0"))
        .stdout(predicate::str::contains("\"width\": 12.0"));
}

#[test]
fn test_invalid_config_json_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(&config, "not json").unwrap();

    get_reportxl_cmd()
        .arg("migrate-widths")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid column config"));
}
