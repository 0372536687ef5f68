//! Inspection record entity - one submitted QC-washing session
//!
//! Field names follow the read-API documents verbatim (`orderNo`,
//! `before_after_wash`, `measured_value_decimal`, ...). Every numeric field is
//! decoded leniently; see [`crate::entities::lenient`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::lenient;

/// Wash stage of a measurement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WashStage {
    #[serde(rename = "Before Wash")]
    BeforeWash,
    #[serde(rename = "After Wash")]
    AfterWash,
}

impl WashStage {
    /// Parse the stage label used in documents
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "before wash" | "before" => Some(WashStage::BeforeWash),
            "after wash" | "after" => Some(WashStage::AfterWash),
            _ => None,
        }
    }

    /// The stage on the other side of the wash
    pub fn opposite(self) -> Self {
        match self {
            WashStage::BeforeWash => WashStage::AfterWash,
            WashStage::AfterWash => WashStage::BeforeWash,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WashStage::BeforeWash => "Before Wash",
            WashStage::AfterWash => "After Wash",
        }
    }
}

impl std::fmt::Display for WashStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pass/fail result of a single measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointResult {
    Pass,
    Fail,
}

impl PointResult {
    pub fn is_pass(&self) -> bool {
        *self == PointResult::Pass
    }
}

impl std::fmt::Display for PointResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointResult::Pass => write!(f, "pass"),
            PointResult::Fail => write!(f, "fail"),
        }
    }
}

/// Anything other than "pass" counts as a fail; absent stays absent
fn opt_point_result<'de, D>(deserializer: D) -> Result<Option<PointResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient::opt_text(deserializer)?;
    Ok(raw.map(|s| {
        if s.trim().eq_ignore_ascii_case("pass") {
            PointResult::Pass
        } else {
            PointResult::Fail
        }
    }))
}

/// One measured point on one garment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementPoint {
    #[serde(rename = "pointName", default, deserialize_with = "lenient::text")]
    pub point_name: String,

    /// Spec value as captured (decimal or fraction text)
    #[serde(default, deserialize_with = "lenient::text")]
    pub specs: String,

    #[serde(rename = "rowNo", default, deserialize_with = "lenient::opt_id", skip_serializing_if = "Option::is_none")]
    pub row_no: Option<String>,

    #[serde(rename = "toleranceMinus", default, deserialize_with = "lenient::opt_f64")]
    pub tolerance_minus: Option<f64>,

    #[serde(rename = "tolerancePlus", default, deserialize_with = "lenient::opt_f64")]
    pub tolerance_plus: Option<f64>,

    #[serde(rename = "toleranceMinus_fraction", default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub tolerance_minus_fraction: Option<String>,

    #[serde(rename = "tolerancePlus_fraction", default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub tolerance_plus_fraction: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub measured_value_decimal: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub measured_value_fraction: Option<String>,

    #[serde(default, deserialize_with = "opt_point_result", skip_serializing_if = "Option::is_none")]
    pub result: Option<PointResult>,
}

/// One inspected garment unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PieceRecord {
    #[serde(rename = "pcNumber", default, deserialize_with = "lenient::id_or_empty")]
    pub pc_number: String,

    #[serde(rename = "measurementPoints", default, deserialize_with = "lenient::seq")]
    pub measurement_points: Vec<MeasurementPoint>,

    /// Set on copies created by piece expansion
    #[serde(rename = "isDuplicated", default, deserialize_with = "lenient::flag", skip_serializing_if = "std::ops::Not::not")]
    pub is_duplicated: bool,
}

impl PieceRecord {
    /// Find a measurement point by name
    pub fn point(&self, point_name: &str) -> Option<&MeasurementPoint> {
        self.measurement_points
            .iter()
            .find(|p| p.point_name == point_name)
    }
}

/// One size bucket within a measurement session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizeRecord {
    #[serde(default, deserialize_with = "lenient::text")]
    pub size: String,

    #[serde(default, deserialize_with = "lenient::opt_id", skip_serializing_if = "Option::is_none")]
    pub kvalue: Option<String>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub pcs: Vec<PieceRecord>,
}

/// Stored per-size summary counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeSummary {
    #[serde(default, deserialize_with = "lenient::text")]
    pub size: String,

    #[serde(default, deserialize_with = "count")]
    pub checked_pcs: i64,

    #[serde(default, deserialize_with = "count")]
    pub checked_points: i64,

    #[serde(default, deserialize_with = "count")]
    pub total_pass: i64,

    #[serde(default, deserialize_with = "count")]
    pub total_fail: i64,

    #[serde(default, deserialize_with = "count")]
    pub plus_tolerance_fail_count: i64,

    #[serde(default, deserialize_with = "count")]
    pub minus_tolerance_fail_count: i64,
}

fn count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::opt_i64(deserializer)?.unwrap_or(0))
}

/// `measurementDetails` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementDetails {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub measurement: Vec<SizeRecord>,

    #[serde(rename = "measurementSizeSummary", default, deserialize_with = "lenient::seq")]
    pub measurement_size_summary: Vec<SizeSummary>,
}

/// `actualAQLValue` block (only the sample size matters here)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualAqlValue {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub sample_size: Option<i64>,
}

/// One submitted QC-washing session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    #[serde(rename = "_id", default, deserialize_with = "lenient::opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub order_no: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub color: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub wash_type: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub report_type: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub factory_name: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub buyer: String,

    #[serde(rename = "before_after_wash", default, deserialize_with = "lenient::text")]
    pub before_after_wash: String,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub order_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub color_order_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub wash_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub display_wash_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_actual_wash_qty: bool,

    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub actual_wash_qty: Option<i64>,

    #[serde(rename = "actualAQLValue", default, skip_serializing_if = "Option::is_none")]
    pub actual_aql_value: Option<ActualAqlValue>,

    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub edited_actual_wash_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_datetime", skip_serializing_if = "Option::is_none")]
    pub last_edited_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub checked_qty: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_checked_pcs: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_checked_point: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_pass: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub total_fail: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pass_rate: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub overall_final_result: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient::opt_datetime", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub measurement_details: Option<MeasurementDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_details: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_details: Option<serde_json::Value>,
}

impl InspectionRecord {
    /// Parsed wash stage, if recognized
    pub fn stage(&self) -> Option<WashStage> {
        WashStage::parse(&self.before_after_wash)
    }

    /// Measured sizes (empty when the record has no measurement block)
    pub fn sizes(&self) -> &[SizeRecord] {
        self.measurement_details
            .as_ref()
            .map(|m| m.measurement.as_slice())
            .unwrap_or(&[])
    }

    /// Stored size summaries
    pub fn size_summaries(&self) -> &[SizeSummary] {
        self.measurement_details
            .as_ref()
            .map(|m| m.measurement_size_summary.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_measurements(&self) -> bool {
        !self.sizes().is_empty()
    }

    /// Quantity counted toward cumulative washing: `displayWashQty ?? washQty`
    pub fn effective_wash_qty(&self) -> i64 {
        self.display_wash_qty.or(self.wash_qty).unwrap_or(0)
    }

    /// Chronological key: `createdAt`, then `date`, then `submittedAt`
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.date).or(self.submitted_at)
    }

    /// Short label for messages
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{} / {} / {}",
                self.order_no, self.color, self.before_after_wash
            ),
        }
    }
}
