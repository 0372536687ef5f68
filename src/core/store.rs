//! Exported record store
//!
//! Records are read from JSON exports of the QC-washing read API: either a
//! top-level array of documents or an envelope object with a `data` array.
//! Writes go through [`RecordFile`], which edits the raw documents so fields
//! this crate does not model are written back untouched.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use walkdir::WalkDir;

use crate::entities::inspection::{InspectionRecord, WashStage};
use crate::entities::lenient::value_as_id;

/// Default cap on listed records
pub const DEFAULT_LIST_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {message}", path.display())]
    Json { path: PathBuf, message: String },

    #[error("{}: expected an array of records or an object with a `data` array", path.display())]
    Shape { path: PathBuf },

    #[error("{}: {message}", path.display())]
    Document { path: PathBuf, message: String },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("no record with id '{0}'")]
    NotFound(String),

    #[error("edited wash quantity '{0}' must be a non-negative whole number")]
    InvalidQty(String),
}

/// JSON files under `path` in path order (just `path` when it is a file)
pub fn json_files(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_json(path: &Path) -> Result<Value, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Documents held by an export: array, `{"data": [...]}`, or a single record
fn documents(root: Value, path: &Path) -> Result<Vec<Value>, StoreError> {
    match root {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(StoreError::Shape {
                path: path.to_path_buf(),
            }),
            None => Ok(vec![Value::Object(map)]),
        },
        _ => Err(StoreError::Shape {
            path: path.to_path_buf(),
        }),
    }
}

/// Raw documents from a file or every `*.json` beneath a directory
pub fn load_raw(path: &Path) -> Result<Vec<Value>, StoreError> {
    let mut all = Vec::new();
    for file in json_files(path)? {
        let root = read_json(&file)?;
        let docs = documents(root, &file)?;
        tracing::debug!(file = %file.display(), count = docs.len(), "loaded documents");
        all.extend(docs);
    }
    Ok(all)
}

/// Typed inspection records; documents that cannot be decoded are skipped
pub fn load_records(path: &Path) -> Result<Vec<InspectionRecord>, StoreError> {
    let docs = load_raw(path)?;
    let total = docs.len();
    let records: Vec<InspectionRecord> = docs
        .into_iter()
        .enumerate()
        .filter_map(|(i, doc)| match serde_json::from_value(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            total,
            path = %path.display(),
            "some records could not be decoded"
        );
    }
    Ok(records)
}

/// Find a record by `_id`
pub fn find_by_id<'a>(records: &'a [InspectionRecord], id: &str) -> Option<&'a InspectionRecord> {
    records.iter().find(|r| r.id.as_deref() == Some(id))
}

/// Parse an edited wash quantity: a non-negative whole number
pub fn parse_edited_wash_qty(text: &str) -> Result<i64, StoreError> {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| StoreError::InvalidQty(text.to_string()))
}

/// A single export file opened for editing
///
/// A file holding one bare record is edited as a one-element list and
/// written back as a bare record while it still holds exactly one.
#[derive(Debug)]
pub struct RecordFile {
    path: PathBuf,
    root: Value,
    single_object: bool,
}

impl RecordFile {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let root = read_json(path)?;
        let single_object = root.as_object().is_some_and(|map| !map.contains_key("data"));
        let root = if single_object {
            Value::Array(vec![root])
        } else {
            root
        };
        let file = Self {
            path: path.to_path_buf(),
            root,
            single_object,
        };
        if file.records().is_none() {
            return Err(StoreError::Shape {
                path: path.to_path_buf(),
            });
        }
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn records(&self) -> Option<&Vec<Value>> {
        match &self.root {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get("data").and_then(Value::as_array),
            _ => None,
        }
    }

    fn records_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.root {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get_mut("data").and_then(Value::as_array_mut),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records()?
            .iter()
            .position(|doc| doc.get("_id").and_then(value_as_id).as_deref() == Some(id))
    }

    /// Record an edited actual wash quantity; `washQty` is left as captured
    pub fn amend_edited_wash_qty(
        &mut self,
        id: &str,
        qty_text: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let qty = parse_edited_wash_qty(qty_text)?;
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let doc = self
            .records_mut()
            .and_then(|r| r.get_mut(index))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        doc.insert("editedActualWashQty".to_string(), Value::from(qty));
        doc.insert(
            "lastEditedAt".to_string(),
            Value::String(now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
        tracing::info!(id, qty, "amended edited wash quantity");
        Ok(qty)
    }

    /// Remove a record, returning the removed document
    pub fn delete(&mut self, id: &str) -> Result<Value, StoreError> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = self
            .records_mut()
            .map(|r| r.remove(index))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        tracing::info!(id, "deleted record");
        Ok(removed)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let out = match self.records().map(Vec::as_slice) {
            Some([only]) if self.single_object => only,
            _ => &self.root,
        };
        let json = serde_json::to_string_pretty(out).map_err(|e| StoreError::Json {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json + "\n").map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Record list filters
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Inclusive, on `createdAt`
    pub start_date: Option<NaiveDate>,
    /// Inclusive through the end of the day
    pub end_date: Option<NaiveDate>,
    pub buyer: Option<String>,
    pub order_no: Option<String>,
    pub color: Option<String>,
    /// Exact inspector id
    pub qc_id: Option<String>,
    pub stage: Option<WashStage>,
    pub report_type: Option<String>,
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
        None => true,
    }
}

impl ListFilter {
    fn date_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start = self
            .start_date
            .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
        let end = self.end_date.and_then(|d| {
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                .map(|t| Utc.from_utc_datetime(&d.and_time(t)))
        });
        (start, end)
    }

    pub fn matches(&self, record: &InspectionRecord) -> bool {
        let (start, end) = self.date_bounds();
        if start.is_some() || end.is_some() {
            let Some(created) = record.created_at else {
                return false;
            };
            if start.is_some_and(|s| created < s) || end.is_some_and(|e| created > e) {
                return false;
            }
        }

        if let Some(qc) = self.qc_id.as_deref().filter(|q| !q.is_empty()) {
            if record.user_id.as_deref() != Some(qc) {
                return false;
            }
        }
        if let Some(stage) = self.stage {
            if record.stage() != Some(stage) {
                return false;
            }
        }
        if let Some(rt) = &self.report_type {
            if !record.report_type.trim().eq_ignore_ascii_case(rt.trim()) {
                return false;
            }
        }

        contains_ci(&record.buyer, &self.buyer)
            && contains_ci(&record.order_no, &self.order_no)
            && contains_ci(&record.color, &self.color)
    }

    /// Matching records, newest first, capped at the limit
    pub fn apply<'a>(&self, records: &'a [InspectionRecord]) -> Vec<&'a InspectionRecord> {
        let mut matched: Vec<&InspectionRecord> =
            records.iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(self.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        matched
    }
}

/// Distinct values available to the list filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub buyers: Vec<String>,
    pub orders: Vec<String>,
    pub colors: Vec<String>,
    pub qc_ids: Vec<String>,
}

pub fn filter_options(records: &[InspectionRecord]) -> FilterOptions {
    fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        let set: std::collections::BTreeSet<String> = values
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        set.into_iter().collect()
    }

    FilterOptions {
        buyers: distinct(records.iter().map(|r| r.buyer.as_str())),
        orders: distinct(records.iter().map(|r| r.order_no.as_str())),
        colors: distinct(records.iter().map(|r| r.color.as_str())),
        qc_ids: distinct(records.iter().filter_map(|r| r.user_id.as_deref())),
    }
}
