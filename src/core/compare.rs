//! Before/after wash comparison
//!
//! Pieces are matched positionally within a size: garment N before the wash
//! is taken to be garment N after it.

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use crate::core::aggregate::{group_values, sort_values, ValueGroup, NOT_AVAILABLE};
use crate::core::fraction::decimal_to_fraction_with;
use crate::core::tolerance::{
    effective_result, measured_decimal, tolerance_as_fraction_with, ToleranceSide,
};
use crate::core::DisplayOptions;
use crate::entities::inspection::{
    InspectionRecord, MeasurementPoint, PieceRecord, SizeRecord, WashStage,
};

/// Marker for sizes measured on only one side of the wash
pub const NO_COMPARISON_DATA: &str = "No comparison data available";

/// Signed change from before to after
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Difference {
    NotAvailable,
    NoChange,
    Growth(f64),
    Shrinkage(f64),
}

impl Difference {
    /// Classify `after - before`; magnitudes below `threshold` are no change
    pub fn between(before: Option<f64>, after: Option<f64>, threshold: f64) -> Self {
        let (Some(before), Some(after)) = (before, after) else {
            return Difference::NotAvailable;
        };
        let diff = after - before;
        if diff.abs() < threshold {
            Difference::NoChange
        } else if diff > 0.0 {
            Difference::Growth(diff)
        } else {
            Difference::Shrinkage(diff.abs())
        }
    }

    /// Signed decimal difference
    pub fn decimal(&self) -> Option<f64> {
        match self {
            Difference::NotAvailable => None,
            Difference::NoChange => Some(0.0),
            Difference::Growth(d) => Some(*d),
            Difference::Shrinkage(d) => Some(-*d),
        }
    }

    /// `+1/8"`, `-1/8"`, `0"` or `N/A`
    pub fn render(&self, denominator: u32) -> String {
        match self {
            Difference::NotAvailable => NOT_AVAILABLE.to_string(),
            Difference::NoChange => "0\"".to_string(),
            Difference::Growth(d) => format!("+{}\"", decimal_to_fraction_with(*d, denominator)),
            Difference::Shrinkage(d) => format!("-{}\"", decimal_to_fraction_with(*d, denominator)),
        }
    }

    pub fn sign(&self) -> &'static str {
        match self {
            Difference::NotAvailable => "n/a",
            Difference::NoChange => "none",
            Difference::Growth(_) => "growth",
            Difference::Shrinkage(_) => "shrinkage",
        }
    }
}

impl std::fmt::Display for Difference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(crate::core::fraction::DEFAULT_DENOMINATOR))
    }
}

impl Serialize for Difference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.sign())
    }
}

/// One garment index compared across the wash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceComparison {
    /// 1-based garment index
    pub index: usize,
    pub before_value: String,
    pub after_value: String,
    pub before_pass: Option<bool>,
    pub after_pass: Option<bool>,
    pub difference_decimal: Option<f64>,
    pub difference_fraction: String,
    #[serde(rename = "differenceSign")]
    pub difference: Difference,
}

fn side_value(point: Option<&MeasurementPoint>) -> (String, Option<bool>, Option<f64>) {
    match point {
        Some(p) => (
            p.measured_value_fraction
                .clone()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            Some(effective_result(p).is_pass()),
            measured_decimal(p),
        ),
        None => (NOT_AVAILABLE.to_string(), None, None),
    }
}

/// Compare one point garment by garment over the longer of the two piece lists
pub fn compare_point(
    point_name: &str,
    before_pcs: &[PieceRecord],
    after_pcs: &[PieceRecord],
    options: &DisplayOptions,
) -> Vec<PieceComparison> {
    let count = before_pcs.len().max(after_pcs.len());
    (0..count)
        .map(|i| {
            let before = before_pcs.get(i).and_then(|pc| pc.point(point_name));
            let after = after_pcs.get(i).and_then(|pc| pc.point(point_name));
            let (before_value, before_pass, before_decimal) = side_value(before);
            let (after_value, after_pass, after_decimal) = side_value(after);
            let difference =
                Difference::between(before_decimal, after_decimal, options.no_change_threshold);

            PieceComparison {
                index: i + 1,
                before_value,
                after_value,
                before_pass,
                after_pass,
                difference_decimal: difference.decimal(),
                difference_fraction: difference.render(options.denominator),
                difference,
            }
        })
        .collect()
}

/// Within/out-of-tolerance counts for one side of a size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToleranceTally {
    pub pieces: usize,
    pub within: usize,
    pub out_of: usize,
}

pub fn tally(size: &SizeRecord) -> ToleranceTally {
    let mut t = ToleranceTally {
        pieces: size.pcs.len(),
        ..Default::default()
    };
    for point in size.pcs.iter().flat_map(|pc| &pc.measurement_points) {
        if effective_result(point).is_pass() {
            t.within += 1;
        } else {
            t.out_of += 1;
        }
    }
    t
}

#[derive(Debug, Clone, Serialize)]
pub struct PointComparison {
    pub point_name: String,
    pub specs: String,
    pub tolerance_minus: String,
    pub tolerance_plus: String,
    /// Union of values seen on either side, in numeric order
    pub values: Vec<String>,
    pub before_groups: Vec<ValueGroup>,
    pub after_groups: Vec<ValueGroup>,
    pub pieces: Vec<PieceComparison>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeComparison {
    pub size: String,
    pub status: ComparisonStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub before: Option<ToleranceTally>,
    pub after: Option<ToleranceTally>,
    pub points: Vec<PointComparison>,
}

impl SizeComparison {
    pub fn is_available(&self) -> bool {
        self.status == ComparisonStatus::Available
    }
}

/// Concatenate pieces of same-named sizes, keeping first-seen size order
pub fn merge_sizes<'a, I>(sizes: I) -> Vec<SizeRecord>
where
    I: IntoIterator<Item = &'a SizeRecord>,
{
    let mut merged: Vec<SizeRecord> = Vec::new();
    for size in sizes {
        match merged.iter_mut().find(|s| s.size == size.size) {
            Some(existing) => existing.pcs.extend(size.pcs.iter().cloned()),
            None => merged.push(size.clone()),
        }
    }
    merged
}

fn points_named<'a>(size: &'a SizeRecord, name: &'a str) -> impl Iterator<Item = &'a MeasurementPoint> + 'a {
    size.pcs.iter().filter_map(move |pc| pc.point(name))
}

fn compare_size(before: &SizeRecord, after: &SizeRecord, options: &DisplayOptions) -> SizeComparison {
    let names: BTreeSet<&str> = before
        .pcs
        .iter()
        .chain(&after.pcs)
        .flat_map(|pc| &pc.measurement_points)
        .map(|p| p.point_name.as_str())
        .collect();

    let points = names
        .into_iter()
        .map(|name| {
            let first = points_named(before, name)
                .next()
                .or_else(|| points_named(after, name).next());
            let tolerance = |side| {
                first
                    .map(|p| tolerance_as_fraction_with(p, side, options.denominator))
                    .unwrap_or_else(|| "0".to_string())
            };

            let before_groups = group_values(points_named(before, name));
            let after_groups = group_values(points_named(after, name));
            let mut values: Vec<String> = before_groups
                .iter()
                .chain(&after_groups)
                .map(|g| g.value.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            sort_values(&mut values, |v| v.as_str());

            PointComparison {
                point_name: name.to_string(),
                specs: first.map(|p| p.specs.clone()).unwrap_or_default(),
                tolerance_minus: tolerance(ToleranceSide::Minus),
                tolerance_plus: tolerance(ToleranceSide::Plus),
                values,
                before_groups,
                after_groups,
                pieces: compare_point(name, &before.pcs, &after.pcs, options),
            }
        })
        .collect();

    SizeComparison {
        size: before.size.clone(),
        status: ComparisonStatus::Available,
        message: None,
        before: Some(tally(before)),
        after: Some(tally(after)),
        points,
    }
}

fn unavailable(size: &SizeRecord, stage: WashStage) -> SizeComparison {
    let side = Some(tally(size));
    let (before, after) = match stage {
        WashStage::BeforeWash => (side, None),
        WashStage::AfterWash => (None, side),
    };
    SizeComparison {
        size: size.size.clone(),
        status: ComparisonStatus::Unavailable,
        message: Some(NO_COMPARISON_DATA.to_string()),
        before,
        after,
        points: Vec::new(),
    }
}

/// Compare before and after size sets
///
/// Sizes follow the before order, then sizes only measured after the wash.
pub fn compare_sizes(
    before: &[SizeRecord],
    after: &[SizeRecord],
    options: &DisplayOptions,
) -> Vec<SizeComparison> {
    let before = merge_sizes(before);
    let after = merge_sizes(after);

    let mut result: Vec<SizeComparison> = before
        .iter()
        .map(|b| match after.iter().find(|a| a.size == b.size) {
            Some(a) => compare_size(b, a, options),
            None => unavailable(b, WashStage::BeforeWash),
        })
        .collect();

    result.extend(
        after
            .iter()
            .filter(|a| !before.iter().any(|b| b.size == a.size))
            .map(|a| unavailable(a, WashStage::AfterWash)),
    );
    result
}

/// Records on the other side of the wash that `record` is compared against
///
/// First Output reports match on order, color and report type; other report
/// types also require the same wash type and factory.
pub fn find_counterparts<'a>(
    record: &InspectionRecord,
    all: &'a [InspectionRecord],
) -> Vec<&'a InspectionRecord> {
    let Some(stage) = record.stage() else {
        return Vec::new();
    };
    let wanted = stage.opposite();
    let first_output = record.report_type.trim().eq_ignore_ascii_case("first output");

    all.iter()
        .filter(|r| r.stage() == Some(wanted) && r.has_measurements())
        .filter(|r| {
            r.order_no == record.order_no
                && r.color == record.color
                && r.report_type == record.report_type
        })
        .filter(|r| {
            first_output || (r.wash_type == record.wash_type && r.factory_name == record.factory_name)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordComparison {
    pub record: String,
    pub stage: Option<WashStage>,
    pub counterparts: Vec<String>,
    pub sizes: Vec<SizeComparison>,
}

/// Compare a record with the merged measurements of its counterparts
pub fn compare_with_counterparts(
    record: &InspectionRecord,
    all: &[InspectionRecord],
    options: &DisplayOptions,
) -> RecordComparison {
    let counterparts = find_counterparts(record, all);
    if counterparts.is_empty() {
        tracing::info!(record = %record.label(), "no counterpart on the other side of the wash");
    }
    let others: Vec<SizeRecord> = counterparts.iter().flat_map(|r| r.sizes().iter().cloned()).collect();

    let sizes = match record.stage() {
        Some(WashStage::AfterWash) => compare_sizes(&others, record.sizes(), options),
        _ => compare_sizes(record.sizes(), &others, options),
    };

    RecordComparison {
        record: record.label(),
        stage: record.stage(),
        counterparts: counterparts.iter().map(|r| r.label()).collect(),
        sizes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inspection::{MeasurementDetails, PointResult};

    fn mp(name: &str, measured: f64, fraction: &str) -> MeasurementPoint {
        MeasurementPoint {
            point_name: name.to_string(),
            specs: "10".to_string(),
            tolerance_minus: Some(0.25),
            tolerance_plus: Some(0.25),
            measured_value_decimal: Some(measured),
            measured_value_fraction: Some(fraction.to_string()),
            result: Some(PointResult::Pass),
            ..Default::default()
        }
    }

    fn pcs(values: &[(&str, f64)]) -> Vec<PieceRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, (name, v))| PieceRecord {
                pc_number: (i + 1).to_string(),
                measurement_points: vec![mp(name, *v, &decimal_to_fraction_with(*v, 16))],
                is_duplicated: false,
            })
            .collect()
    }

    #[test]
    fn test_difference_signs() {
        let o = DisplayOptions::default();
        assert_eq!(Difference::between(Some(10.0), Some(10.125), 0.001).render(16), "+1/8\"");
        assert_eq!(Difference::between(Some(10.125), Some(10.0), 0.001).render(16), "-1/8\"");
        assert_eq!(Difference::between(Some(10.0), Some(10.0005), 0.001).render(16), "0\"");
        assert_eq!(Difference::between(None, Some(10.0), 0.001).to_string(), "N/A");
        assert_eq!(
            Difference::between(Some(10.125), Some(10.0), o.no_change_threshold).decimal(),
            Some(-0.125)
        );
    }

    #[test]
    fn test_compare_point_positional() {
        let before = pcs(&[("Chest", 10.0), ("Chest", 10.0), ("Waist", 8.0)]);
        let after = pcs(&[("Chest", 10.125), ("Chest", 9.9375)]);
        let rows = compare_point("Chest", &before, &after, &DisplayOptions::default());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].difference_fraction, "+1/8\"");
        assert_eq!(rows[1].difference_fraction, "-1/16\"");
        assert_eq!(rows[2].difference_fraction, "N/A");
        assert_eq!(rows[2].before_value, "N/A");
        assert_eq!(rows[2].after_pass, None);
        assert_eq!(rows[0].before_pass, Some(true));
    }

    #[test]
    fn test_compare_sizes_marks_one_sided() {
        let size = |name: &str, values: &[(&str, f64)]| SizeRecord {
            size: name.to_string(),
            kvalue: None,
            pcs: pcs(values),
        };
        let before = vec![size("M", &[("Chest", 10.0)]), size("S", &[("Chest", 9.0)])];
        let after = vec![size("M", &[("Chest", 10.125)]), size("XL", &[("Chest", 12.0)])];

        let result = compare_sizes(&before, &after, &DisplayOptions::default());
        let names: Vec<&str> = result.iter().map(|s| s.size.as_str()).collect();
        assert_eq!(names, vec!["M", "S", "XL"]);

        assert!(result[0].is_available());
        assert_eq!(result[0].points[0].values, vec!["10", "10 1/8"]);
        assert_eq!(result[0].before.unwrap().within, 1);

        assert!(!result[1].is_available());
        assert_eq!(result[1].message.as_deref(), Some(NO_COMPARISON_DATA));
        assert!(result[1].points.is_empty());
        assert!(result[1].before.is_some() && result[1].after.is_none());
        assert!(result[2].after.is_some() && result[2].before.is_none());
    }

    fn record(stage: &str, report: &str, wash: &str, factory: &str) -> InspectionRecord {
        InspectionRecord {
            id: Some(format!("{}-{}-{}", stage, wash, factory)),
            order_no: "GPAR1".to_string(),
            color: "NAVY".to_string(),
            wash_type: wash.to_string(),
            report_type: report.to_string(),
            factory_name: factory.to_string(),
            before_after_wash: stage.to_string(),
            measurement_details: Some(MeasurementDetails {
                measurement: vec![SizeRecord {
                    size: "M".to_string(),
                    kvalue: None,
                    pcs: pcs(&[("Chest", 10.0)]),
                }],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_counterparts() {
        let current = record("After Wash", "Inline", "Normal Wash", "YM");
        let mut empty = record("Before Wash", "Inline", "Normal Wash", "YM");
        empty.measurement_details = None;
        let all = vec![
            record("Before Wash", "Inline", "Normal Wash", "YM"),
            record("Before Wash", "Inline", "Acid Wash", "YM"),
            record("After Wash", "Inline", "Normal Wash", "YM"),
            empty,
        ];
        let found = find_counterparts(&current, &all);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].wash_type, "Normal Wash");

        // First Output ignores wash type and factory
        let current = record("After Wash", "First Output", "Normal Wash", "YM");
        let all = vec![
            record("Before Wash", "First Output", "Acid Wash", "Other"),
            record("Before Wash", "Inline", "Normal Wash", "YM"),
        ];
        assert_eq!(find_counterparts(&current, &all).len(), 1);
    }

    #[test]
    fn test_compare_with_counterparts_orients_stages() {
        let mut after = record("After Wash", "Inline", "Normal Wash", "YM");
        after.measurement_details.as_mut().unwrap().measurement[0].pcs = pcs(&[("Chest", 9.875)]);
        let before = record("Before Wash", "Inline", "Normal Wash", "YM");
        let all = vec![before, after.clone()];

        let cmp = compare_with_counterparts(&after, &all, &DisplayOptions::default());
        assert_eq!(cmp.counterparts.len(), 1);
        assert_eq!(cmp.sizes[0].points[0].pieces[0].difference_fraction, "-1/8\"");

        let lonely = compare_with_counterparts(&after, &[], &DisplayOptions::default());
        assert!(lonely.counterparts.is_empty());
        assert_eq!(lonely.sizes[0].status, ComparisonStatus::Unavailable);
    }
}
