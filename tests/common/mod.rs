//! Shared test helpers for integration tests
//!
//! Every command runs inside a temp directory with its own config home so
//! user and local config files never leak in.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::cargo;
use assert_cmd::Command;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper to get a wqc command isolated from the caller's environment
pub fn wqc(tmp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("wqc"));
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("HOME", tmp.path())
        .env_remove("WQC_DATA")
        .env_remove("WQC_FORMAT")
        .env_remove("WQC_LOG")
        .env_remove("WQC_API_BASE_URL")
        .env_remove("WQC_FRACTION_DENOMINATOR")
        .env_remove("WQC_MATCH_WINDOW_SECS")
        .env_remove("WQC_NO_CHANGE_THRESHOLD")
        .env_remove("WQC_JPEG_SCAN_LIMIT")
        .env_remove("WQC_LIST_LIMIT");
    cmd
}

/// Write a JSON document into the temp dir and return its path
pub fn write_json(tmp: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// Read a JSON document back from disk
pub fn read_json(path: &PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// A measured point with symmetric tolerance
pub fn point(name: &str, spec: &str, tol: f64, measured: f64, fraction: &str, result: &str) -> Value {
    json!({
        "pointName": name,
        "specs": spec,
        "toleranceMinus": -tol,
        "tolerancePlus": tol,
        "measured_value_decimal": measured,
        "measured_value_fraction": fraction,
        "result": result
    })
}

/// A record skeleton for order GPAR1234 / NAVY, Inline, Garment Wash
pub fn record(id: &str, stage: &str, wash_qty: i64, created_at: &str) -> Value {
    json!({
        "_id": id,
        "orderNo": "GPAR1234",
        "color": "NAVY",
        "buyer": "Aritzia",
        "washType": "Garment Wash",
        "reportType": "Inline",
        "factoryName": "YM",
        "before_after_wash": stage,
        "washQty": wash_qty,
        "colorOrderQty": 500,
        "userId": "QC001",
        "createdAt": created_at
    })
}

/// Three After Wash sessions of 100, 150 and 200 pieces against an order of 500
pub fn progress_export(tmp: &TempDir) -> PathBuf {
    write_json(
        tmp,
        "export.json",
        &json!([
            record("a3", "After Wash", 200, "2025-03-03T08:00:00Z"),
            record("a1", "After Wash", 100, "2025-03-01T08:00:00Z"),
            record("a2", "After Wash", 150, "2025-03-02T08:00:00Z"),
        ]),
    )
}

/// A before/after pair measured on one Chest point, size M
pub fn comparison_export(tmp: &TempDir) -> PathBuf {
    let mut before = record("b1", "Before Wash", 100, "2025-03-01T08:00:00Z");
    before["measurementDetails"] = json!({
        "measurement": [{
            "size": "M",
            "kvalue": "K1",
            "pcs": [{"pcNumber": 1, "measurementPoints": [point("Chest", "10", 0.25, 10.0, "10", "pass")]}]
        }]
    });
    let mut after = record("w1", "After Wash", 100, "2025-03-02T08:00:00Z");
    after["measurementDetails"] = json!({
        "measurement": [{
            "size": "M",
            "kvalue": "K1",
            "pcs": [{"pcNumber": 1, "measurementPoints": [point("Chest", "10", 0.25, 10.125, "10 1/8", "pass")]}]
        }],
        "measurementSizeSummary": [
            {"size": "M", "checkedPcs": 1, "checkedPoints": 1, "totalPass": 1, "totalFail": 0}
        ]
    });
    write_json(tmp, "export.json", &json!({"data": [before, after]}))
}
