//! Wash quantity, listing and record editing tests

mod common;

use common::{progress_export, read_json, record, wqc, write_json};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Progress Tests
// ============================================================================

#[test]
fn test_progress_second_of_three() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["progress", "a2", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alreadyWashedQty\": 250"))
        .stdout(predicate::str::contains("\"remainingQty\": 250"))
        .stdout(predicate::str::contains("\"totalRecords\": 3"))
        .stdout(predicate::str::contains("\"currentRecordPosition\": 2"));
}

#[test]
fn test_progress_single_record() {
    let tmp = TempDir::new().unwrap();
    let mut only = record("s1", "After Wash", 80, "2025-03-01T08:00:00Z");
    only["colorOrderQty"] = json!(200);
    let data = write_json(&tmp, "export.json", &json!([only]));

    wqc(&tmp)
        .args(["progress", "s1", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alreadyWashedQty\": 80"))
        .stdout(predicate::str::contains("\"remainingQty\": 120"))
        .stdout(predicate::str::contains("\"totalRecords\": 1"))
        .stdout(predicate::str::contains("\"currentRecordPosition\": 1"));
}

#[test]
fn test_progress_remaining_never_negative() {
    let tmp = TempDir::new().unwrap();
    let mut over = record("o1", "After Wash", 650, "2025-03-01T08:00:00Z");
    over["colorOrderQty"] = json!(500);
    let data = write_json(&tmp, "export.json", &json!([over]));

    wqc(&tmp)
        .args(["progress", "o1", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"remainingQty\": 0"));
}

#[test]
fn test_progress_rejects_negative_window() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["progress", "a2", "--window=-5", "-d"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--window"));
}

#[test]
fn test_progress_uses_data_env() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["progress", "a3", "-f", "json"])
        .env("WQC_DATA", &data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"alreadyWashedQty\": 450"));
}

#[test]
fn test_progress_unknown_id() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["progress", "nope", "-d"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No record with id 'nope'"));
}

// ============================================================================
// List and Filter Tests
// ============================================================================

#[test]
fn test_list_newest_first() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    let output = wqc(&tmp)
        .args(["list", "-f", "tsv", "-d"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout
        .lines()
        .skip(1)
        .filter_map(|l| l.split('\t').next())
        .collect();
    assert_eq!(ids, vec!["a3", "a2", "a1"]);
}

#[test]
fn test_list_date_range_is_inclusive() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["list", "--from", "2025-03-01", "--to", "2025-03-02", "--count", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_list_filters_case_insensitive_and_limit() {
    let tmp = TempDir::new().unwrap();
    let mut other = record("x1", "Before Wash", 90, "2025-03-04T08:00:00Z");
    other["orderNo"] = json!("GPHK0001");
    other["buyer"] = json!("MWW");
    let data = write_json(
        &tmp,
        "export.json",
        &json!([
            record("a1", "After Wash", 100, "2025-03-01T08:00:00Z"),
            record("a2", "After Wash", 150, "2025-03-02T08:00:00Z"),
            other,
        ]),
    );

    wqc(&tmp)
        .args(["list", "--order", "gpar", "--count", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout("2\n");

    wqc(&tmp)
        .args(["list", "--stage", "before", "--count", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout("1\n");

    wqc(&tmp)
        .args(["list", "--limit", "1", "--count", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_list_loads_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("exports");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(
        dir.join("a.json"),
        json!([record("a1", "After Wash", 100, "2025-03-01T08:00:00Z")]).to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.join("b.json"),
        json!({"data": [record("a2", "After Wash", 150, "2025-03-02T08:00:00Z")]}).to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

    wqc(&tmp)
        .args(["list", "--count", "-d"])
        .arg(&dir)
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_filters_lists_distinct_values() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["filters", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"buyers\": [\n    \"Aritzia\"\n  ]"))
        .stdout(predicate::str::contains("\"qcIds\""));
}

// ============================================================================
// Wash Quantity Resolution
// ============================================================================

#[test]
fn test_list_actual_view_prefers_edited_qty() {
    let tmp = TempDir::new().unwrap();
    let mut edited = record("e1", "After Wash", 100, "2025-03-01T08:00:00Z");
    edited["factoryName"] = json!("PTCL");
    edited["editedActualWashQty"] = json!(96);
    let data = write_json(&tmp, "export.json", &json!([edited]));

    wqc(&tmp)
        .args(["list", "--view", "actual", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"displayWashQty\": 96"))
        .stdout(predicate::str::contains("\"originalWashQty\": 100"));
}

#[test]
fn test_list_actual_view_uses_real_wash_table() {
    let tmp = TempDir::new().unwrap();
    let mut ym = record("y1", "After Wash", 100, "2025-03-01T08:00:00Z");
    ym["color"] = json!("藏青[NAVY]");
    ym["date"] = json!("2025-03-01T00:00:00Z");
    let data = write_json(&tmp, "export.json", &json!([ym]));
    let table = write_json(
        &tmp,
        "real.json",
        &json!([
            {"inspectionDate": "2025-03-01T00:00:00Z", "Style_No": "GPAR1234", "color": "NAVY", "washQty": 60},
            {"inspectionDate": "2025-03-01T00:00:00Z", "Style_No": "GPAR1234", "color": "NAVY", "washQty": 45},
            {"inspectionDate": "2025-03-02T00:00:00Z", "Style_No": "GPAR1234", "color": "NAVY", "washQty": 999}
        ]),
    );

    wqc(&tmp)
        .args(["list", "--view", "actual", "-f", "json", "--real-qty"])
        .arg(&table)
        .arg("-d")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"displayWashQty\": 105"))
        .stdout(predicate::str::contains("\"source\""));
}

#[test]
fn test_list_estimated_view_keeps_original() {
    let tmp = TempDir::new().unwrap();
    let mut edited = record("e1", "After Wash", 100, "2025-03-01T08:00:00Z");
    edited["factoryName"] = json!("PTCL");
    edited["editedActualWashQty"] = json!(96);
    let data = write_json(&tmp, "export.json", &json!([edited]));

    wqc(&tmp)
        .args(["list", "-f", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"displayWashQty\": 100"));
}

// ============================================================================
// Edit and Delete Tests
// ============================================================================

#[test]
fn test_edit_qty_persists() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["edit-qty", "a2", "175", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set edited wash quantity"));

    let saved = read_json(&data);
    let a2 = saved
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["_id"] == "a2")
        .unwrap();
    assert_eq!(a2["editedActualWashQty"], 175);
    assert_eq!(a2["washQty"], 150);
    assert!(a2["lastEditedAt"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn test_edit_qty_rejects_bad_quantity() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);
    let before = std::fs::read_to_string(&data).unwrap();

    wqc(&tmp)
        .args(["edit-qty", "a2", "12abc", "-d"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative whole number"));

    assert_eq!(std::fs::read_to_string(&data).unwrap(), before);
}

#[test]
fn test_edit_qty_single_record_file() {
    let tmp = TempDir::new().unwrap();
    let data = write_json(
        &tmp,
        "one.json",
        &record("s1", "After Wash", 80, "2025-03-01T08:00:00Z"),
    );

    wqc(&tmp)
        .args(["edit-qty", "s1", "72", "-d"])
        .arg(&data)
        .assert()
        .success();

    let saved = read_json(&data);
    assert_eq!(saved["_id"], "s1");
    assert_eq!(saved["editedActualWashQty"], 72);
}

#[test]
fn test_edit_qty_needs_a_file() {
    let tmp = TempDir::new().unwrap();
    progress_export(&tmp);

    wqc(&tmp)
        .args(["edit-qty", "a2", "10", "-d"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("single JSON file"));
}

#[test]
fn test_delete_with_yes() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["delete", "a1", "--yes", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 record(s) left"));

    let saved = read_json(&data);
    assert_eq!(saved.as_array().unwrap().len(), 2);
    assert!(saved.as_array().unwrap().iter().all(|r| r["_id"] != "a1"));
}

#[test]
fn test_delete_declined_keeps_file() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["delete", "a1", "-d"])
        .arg(&data)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    assert_eq!(read_json(&data).as_array().unwrap().len(), 3);
}

#[test]
fn test_delete_unknown_id() {
    let tmp = TempDir::new().unwrap();
    let data = progress_export(&tmp);

    wqc(&tmp)
        .args(["delete", "zz", "--yes", "-d"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record with id 'zz'"));
}
