//! Wash quantity reconciliation
//!
//! Cumulative washed quantity for a record within its order group, and the
//! quantity a record displays in estimated or actual view.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::store::StoreError;
use crate::entities::inspection::InspectionRecord;
use crate::entities::lenient;

/// Default tolerance for the quantity + timestamp position heuristic
pub const DEFAULT_MATCH_WINDOW_SECS: i64 = 5;

/// Fields two records must share to belong to the same washing sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MatchKey {
    pub order_no: String,
    pub before_after_wash: String,
    pub color: String,
    pub wash_type: String,
    pub report_type: String,
}

impl MatchKey {
    pub fn of(record: &InspectionRecord) -> Self {
        Self {
            order_no: record.order_no.trim().to_string(),
            before_after_wash: record.before_after_wash.trim().to_string(),
            color: record.color.trim().to_string(),
            wash_type: record.wash_type.trim().to_string(),
            report_type: record.report_type.trim().to_string(),
        }
    }

    pub fn matches(&self, record: &InspectionRecord) -> bool {
        *self == Self::of(record)
    }
}

/// How the current record's position in its group was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionMatch {
    /// No other record shares the key
    SoleRecord,
    /// Same record identifier
    Identity,
    /// Same wash quantity and timestamps within the match window
    Heuristic,
    /// Nothing matched; treated as the latest record
    AssumedLatest,
}

impl std::fmt::Display for PositionMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionMatch::SoleRecord => write!(f, "sole record"),
            PositionMatch::Identity => write!(f, "identity"),
            PositionMatch::Heuristic => write!(f, "quantity and time"),
            PositionMatch::AssumedLatest => write!(f, "assumed latest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WashProgress {
    pub already_washed_qty: i64,
    pub remaining_qty: i64,
    pub total_records: usize,
    /// 1-based
    pub current_record_position: usize,
    pub resolution: PositionMatch,
}

/// Progress of `current` within `all`, using the default match window
pub fn compute_wash_progress(current: &InspectionRecord, all: &[InspectionRecord]) -> WashProgress {
    compute_wash_progress_with(current, all, DEFAULT_MATCH_WINDOW_SECS)
}

/// Progress of `current` within the records of `all` that share its key
///
/// Never fails: absent quantities count as zero, sums saturate, a negative
/// window is treated as zero and an unlocatable record is taken to be the
/// latest one.
pub fn compute_wash_progress_with(
    current: &InspectionRecord,
    all: &[InspectionRecord],
    window_secs: i64,
) -> WashProgress {
    let target = current.color_order_qty.unwrap_or(0);
    let key = MatchKey::of(current);

    let mut group: Vec<&InspectionRecord> = all.iter().filter(|r| key.matches(r)).collect();
    if group.is_empty() {
        let washed = current.effective_wash_qty();
        return WashProgress {
            already_washed_qty: washed,
            remaining_qty: target.saturating_sub(washed).max(0),
            total_records: 1,
            current_record_position: 1,
            resolution: PositionMatch::SoleRecord,
        };
    }

    // Stable: equal timestamps keep input order, undated records come first
    group.sort_by_key(|r| r.timestamp());

    let (index, resolution) = locate(current, &group, window_secs);
    let washed = group[..=index]
        .iter()
        .fold(0i64, |acc, r| acc.saturating_add(r.effective_wash_qty()));

    WashProgress {
        already_washed_qty: washed,
        remaining_qty: target.saturating_sub(washed).max(0),
        total_records: group.len(),
        current_record_position: index + 1,
        resolution,
    }
}

fn locate(
    current: &InspectionRecord,
    group: &[&InspectionRecord],
    window_secs: i64,
) -> (usize, PositionMatch) {
    if let Some(id) = current.id.as_deref() {
        if let Some(i) = group.iter().position(|r| r.id.as_deref() == Some(id)) {
            return (i, PositionMatch::Identity);
        }
    }

    let qty = current.effective_wash_qty();
    let window_ms = window_secs.max(0).saturating_mul(1000);
    if let Some(at) = current.timestamp() {
        let heuristic = group.iter().position(|r| {
            r.effective_wash_qty() == qty
                && r
                    .timestamp()
                    .is_some_and(|t| (t - at).num_milliseconds().saturating_abs() <= window_ms)
        });
        if let Some(i) = heuristic {
            tracing::info!(
                record = %current.label(),
                position = i + 1,
                "located record by quantity and timestamp"
            );
            return (i, PositionMatch::Heuristic);
        }
    }

    tracing::warn!(
        record = %current.label(),
        total = group.len(),
        "record not found in its group, assuming it is the latest"
    );
    (group.len() - 1, PositionMatch::AssumedLatest)
}

/// Which quantity the list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WashQtyView {
    #[default]
    Estimated,
    Actual,
}

impl std::fmt::Display for WashQtyView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WashQtyView::Estimated => write!(f, "estimated"),
            WashQtyView::Actual => write!(f, "actual"),
        }
    }
}

/// Where a displayed wash quantity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WashQtySource {
    Original,
    QcwashingActual,
    FirstOutput,
    Sop,
    QcRealWashQtyYm,
    EditedActualWashQty,
}

impl std::fmt::Display for WashQtySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WashQtySource::Original => "original",
            WashQtySource::QcwashingActual => "qcwashing_actual",
            WashQtySource::FirstOutput => "first_output",
            WashQtySource::Sop => "sop",
            WashQtySource::QcRealWashQtyYm => "qc_real_wash_qty_ym",
            WashQtySource::EditedActualWashQty => "edited_actual_wash_qty",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WashQtyResolution {
    pub display_wash_qty: i64,
    pub is_actual_wash_qty: bool,
    pub original_wash_qty: i64,
    pub source: WashQtySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_checked_qty: Option<i64>,
}

/// Lookup of quantities from the uploaded real-wash-quantity table
pub trait RealWashQtyLookup {
    /// Total real wash quantity for a style and color code on a date
    fn real_wash_qty(&self, date: NaiveDate, style_no: &str, color: &str) -> Option<i64>;
}

/// No table available
pub struct NoRealWashQty;

impl RealWashQtyLookup for NoRealWashQty {
    fn real_wash_qty(&self, _date: NaiveDate, _style_no: &str, _color: &str) -> Option<i64> {
        None
    }
}

/// One row of the real-wash-quantity upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealWashQtyEntry {
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub inspection_date: Option<DateTime<Utc>>,

    #[serde(alias = "Style_No", default, deserialize_with = "lenient::text")]
    pub style_no: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub color: String,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub wash_qty: Option<i64>,
}

/// Table-backed [`RealWashQtyLookup`]
#[derive(Debug, Clone, Default)]
pub struct RealWashQtyTable {
    entries: Vec<RealWashQtyEntry>,
}

impl RealWashQtyTable {
    pub fn new(entries: Vec<RealWashQtyEntry>) -> Self {
        Self { entries }
    }

    /// Load rows from a JSON array (or `{"data": [...]}`) file
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let values = crate::core::store::load_raw(path)?;
        let entries = values
            .into_iter()
            .map(|v| {
                serde_json::from_value(v).map_err(|e| StoreError::Document {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RealWashQtyLookup for RealWashQtyTable {
    /// Rows of the first matching stored color are summed; colors match
    /// exactly, by case-insensitive containment, or as a `[CODE]` suffix.
    fn real_wash_qty(&self, date: NaiveDate, style_no: &str, color: &str) -> Option<i64> {
        let needle = color.to_lowercase();
        let candidates: Vec<&RealWashQtyEntry> = self
            .entries
            .iter()
            .filter(|e| e.inspection_date.map(|d| d.date_naive()) == Some(date))
            .filter(|e| e.style_no == style_no)
            .filter(|e| e.color == color || e.color.to_lowercase().contains(&needle))
            .collect();

        let first_color = candidates.first()?.color.clone();
        Some(
            candidates
                .iter()
                .filter(|e| e.color == first_color)
                .map(|e| e.wash_qty.unwrap_or(0))
                .sum(),
        )
    }
}

/// Color code inside brackets, e.g. `"黑色[BLACK]" -> "BLACK"`
pub fn extract_color_code(color: &str) -> &str {
    color
        .find('[')
        .and_then(|start| {
            let rest = &color[start + 1..];
            rest.find(']').map(|end| &rest[..end])
        })
        .filter(|code| !code.is_empty())
        .unwrap_or(color)
}

/// Decide which wash quantity a record displays
pub fn resolve_display_wash_qty(
    record: &InspectionRecord,
    view: WashQtyView,
    lookup: &dyn RealWashQtyLookup,
) -> WashQtyResolution {
    let original = record.wash_qty.unwrap_or(0);
    let fallback = WashQtyResolution {
        display_wash_qty: original,
        is_actual_wash_qty: false,
        original_wash_qty: original,
        source: WashQtySource::Original,
        display_checked_qty: record.checked_qty,
    };

    if view == WashQtyView::Estimated {
        return fallback;
    }

    if let Some(actual) = record.actual_wash_qty {
        return WashQtyResolution {
            display_wash_qty: actual,
            is_actual_wash_qty: true,
            source: WashQtySource::QcwashingActual,
            display_checked_qty: record
                .actual_aql_value
                .as_ref()
                .and_then(|a| a.sample_size)
                .filter(|&n| n != 0)
                .or(record.checked_qty),
            ..fallback
        };
    }

    let report_type = record.report_type.trim().to_lowercase();
    match report_type.as_str() {
        "first output" | "sop" => {
            return WashQtyResolution {
                is_actual_wash_qty: true,
                source: if report_type == "sop" {
                    WashQtySource::Sop
                } else {
                    WashQtySource::FirstOutput
                },
                ..fallback
            };
        }
        "inline" => {}
        _ => return fallback,
    }

    if record.factory_name.trim().eq_ignore_ascii_case("YM") {
        let style_no = record.order_no.trim();
        let color = extract_color_code(record.color.trim());
        let Some(date) = record.date.map(|d| d.date_naive()) else {
            return fallback;
        };
        if style_no.is_empty() || color.is_empty() {
            return fallback;
        }
        match lookup.real_wash_qty(date, style_no, color) {
            Some(qty) if qty > 0 => WashQtyResolution {
                display_wash_qty: qty,
                is_actual_wash_qty: true,
                source: WashQtySource::QcRealWashQtyYm,
                ..fallback
            },
            _ => {
                tracing::debug!(record = %record.label(), %date, style_no, color, "no real wash quantity found");
                fallback
            }
        }
    } else if let Some(edited) = record.edited_actual_wash_qty {
        WashQtyResolution {
            display_wash_qty: edited,
            is_actual_wash_qty: true,
            source: WashQtySource::EditedActualWashQty,
            ..fallback
        }
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(id: &str, qty: i64, secs: i64) -> InspectionRecord {
        InspectionRecord {
            id: Some(id.to_string()),
            order_no: "GPAR1234".to_string(),
            color: "NAVY".to_string(),
            wash_type: "Normal Wash".to_string(),
            report_type: "Inline".to_string(),
            before_after_wash: "After Wash".to_string(),
            color_order_qty: Some(500),
            wash_qty: Some(qty),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).single(),
            ..Default::default()
        }
    }

    #[test]
    fn test_progress_by_identity() {
        let all = vec![rec("c", 200, 300), rec("a", 100, 100), rec("b", 150, 200)];
        let p = compute_wash_progress(&all[2], &all);
        assert_eq!(p.already_washed_qty, 250);
        assert_eq!(p.remaining_qty, 250);
        assert_eq!(p.current_record_position, 2);
        assert_eq!(p.total_records, 3);
        assert_eq!(p.resolution, PositionMatch::Identity);
    }

    #[test]
    fn test_progress_sole_record() {
        let mut current = rec("x", 80, 0);
        current.color_order_qty = Some(200);
        let mut other = rec("y", 50, 0);
        other.color = "RED".to_string();

        let p = compute_wash_progress(&current, &[other]);
        assert_eq!(p.already_washed_qty, 80);
        assert_eq!(p.remaining_qty, 120);
        assert_eq!((p.current_record_position, p.total_records), (1, 1));
        assert_eq!(p.resolution, PositionMatch::SoleRecord);
    }

    #[test]
    fn test_progress_heuristic_match() {
        let all = vec![rec("a", 100, 0), rec("b", 150, 100), rec("c", 200, 200)];
        // Same quantity as "b", ids differ, created 4 seconds later
        let current = rec("unsaved", 150, 104);
        let p = compute_wash_progress(&current, &all);
        assert_eq!(p.resolution, PositionMatch::Heuristic);
        assert_eq!(p.current_record_position, 2);
        assert_eq!(p.already_washed_qty, 250);

        // Outside the window falls back to the latest record
        let late = rec("unsaved", 150, 106);
        let p = compute_wash_progress(&late, &all);
        assert_eq!(p.resolution, PositionMatch::AssumedLatest);
        assert_eq!(p.current_record_position, 3);
        assert_eq!(p.already_washed_qty, 450);
    }

    #[test]
    fn test_progress_remaining_never_negative() {
        let all = vec![rec("a", 400, 0), rec("b", 300, 10)];
        let p = compute_wash_progress(&all[1], &all);
        assert_eq!(p.already_washed_qty, 700);
        assert_eq!(p.remaining_qty, 0);
    }

    #[test]
    fn test_progress_huge_window_still_matches() {
        let all = vec![rec("a", 100, 0), rec("b", 150, 100)];
        let current = rec("unsaved", 150, 50);
        let p = compute_wash_progress_with(&current, &all, i64::MAX);
        assert_eq!(p.resolution, PositionMatch::Heuristic);
        assert_eq!(p.current_record_position, 2);
        assert_eq!(p.already_washed_qty, 250);

        // Negative windows behave like zero
        let p = compute_wash_progress_with(&current, &all, -10);
        assert_eq!(p.resolution, PositionMatch::AssumedLatest);
    }

    #[test]
    fn test_progress_saturates_huge_quantities() {
        let all = vec![rec("a", i64::MAX, 0), rec("b", 1, 10)];
        let p = compute_wash_progress(&all[1], &all);
        assert_eq!(p.already_washed_qty, i64::MAX);
        assert_eq!(p.remaining_qty, 0);

        let mut owed = rec("x", i64::MIN, 0);
        owed.color = "RED".to_string();
        let p = compute_wash_progress(&owed, &all);
        assert_eq!(p.resolution, PositionMatch::SoleRecord);
        assert_eq!(p.remaining_qty, i64::MAX);
    }

    #[test]
    fn test_progress_prefers_display_qty_and_undated_first() {
        let mut a = rec("a", 100, 0);
        a.display_wash_qty = Some(90);
        let mut undated = rec("u", 10, 0);
        undated.created_at = None;
        let b = rec("b", 50, 5);
        let all = vec![a, b, undated];

        let p = compute_wash_progress(&all[0], &all);
        assert_eq!(p.current_record_position, 2);
        assert_eq!(p.already_washed_qty, 100);
    }

    struct FixedTable(i64);

    impl RealWashQtyLookup for FixedTable {
        fn real_wash_qty(&self, _date: NaiveDate, _style: &str, color: &str) -> Option<i64> {
            (color == "BLK").then_some(self.0)
        }
    }

    #[test]
    fn test_display_qty_sources() {
        let mut r = rec("a", 120, 0);
        assert_eq!(
            resolve_display_wash_qty(&r, WashQtyView::Estimated, &NoRealWashQty).source,
            WashQtySource::Original
        );

        r.edited_actual_wash_qty = Some(111);
        r.factory_name = "Other".to_string();
        let res = resolve_display_wash_qty(&r, WashQtyView::Actual, &NoRealWashQty);
        assert_eq!(res.source, WashQtySource::EditedActualWashQty);
        assert_eq!(res.display_wash_qty, 111);
        assert_eq!(res.original_wash_qty, 120);

        r.factory_name = "YM".to_string();
        r.color = "Black [BLK]".to_string();
        r.date = r.created_at;
        let res = resolve_display_wash_qty(&r, WashQtyView::Actual, &FixedTable(300));
        assert_eq!(res.source, WashQtySource::QcRealWashQtyYm);
        assert_eq!(res.display_wash_qty, 300);

        let res = resolve_display_wash_qty(&r, WashQtyView::Actual, &FixedTable(0));
        assert_eq!(res.source, WashQtySource::Original);
        assert!(!res.is_actual_wash_qty);

        r.report_type = "SOP".to_string();
        assert_eq!(
            resolve_display_wash_qty(&r, WashQtyView::Actual, &NoRealWashQty).source,
            WashQtySource::Sop
        );

        r.actual_wash_qty = Some(95);
        let res = resolve_display_wash_qty(&r, WashQtyView::Actual, &NoRealWashQty);
        assert_eq!(res.source, WashQtySource::QcwashingActual);
        assert_eq!(res.display_wash_qty, 95);
    }

    #[test]
    fn test_extract_color_code() {
        assert_eq!(extract_color_code("黑色[BLACK]"), "BLACK");
        assert_eq!(extract_color_code("NAVY"), "NAVY");
        assert_eq!(extract_color_code("Odd []"), "Odd []");
    }

    #[test]
    fn test_real_wash_qty_table() {
        let day = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).single();
        let entry = |color: &str, qty: i64| RealWashQtyEntry {
            inspection_date: day,
            style_no: "GPAR1234".to_string(),
            color: color.to_string(),
            wash_qty: Some(qty),
        };
        let table = RealWashQtyTable::new(vec![
            entry("黑色[BLACK]", 100),
            entry("黑色[BLACK]", 40),
            entry("NAVY", 70),
        ]);
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(table.real_wash_qty(date, "GPAR1234", "black"), Some(140));
        assert_eq!(table.real_wash_qty(date, "GPAR1234", "RED"), None);
        assert_eq!(table.real_wash_qty(date, "OTHER", "NAVY"), None);
    }
}
