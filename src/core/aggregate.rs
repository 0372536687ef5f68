//! Measurement aggregation
//!
//! Groups per-piece measurement points by point name and measured value,
//! derives size summaries, and checks the stored summaries against their
//! additivity invariant without ever repairing them.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::core::fraction::fraction_to_decimal;
use crate::core::tolerance::{
    effective_result, evaluate_point, tolerance_as_fraction_with, ToleranceSide,
};
use crate::core::DisplayOptions;
use crate::entities::inspection::{
    InspectionRecord, MeasurementPoint, PieceRecord, PointResult, SizeRecord, SizeSummary,
};

/// Placeholder for a missing measured value
pub const NOT_AVAILABLE: &str = "N/A";

/// Upper bound on the pieces [`expand_to_checked_qty`] will produce
pub const MAX_EXPANDED_PIECES: usize = 10_000;

/// One piece's value for a point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub pc_number: String,
    pub value: String,
    pub result: PointResult,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicated: bool,
}

/// Pass/fail occurrences at one distinct measured value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueGroup {
    pub value: String,
    pub pass: usize,
    pub fail: usize,
}

impl ValueGroup {
    pub fn total(&self) -> usize {
        self.pass + self.fail
    }
}

/// Everything observed for one point name within one size
#[derive(Debug, Clone, Serialize)]
pub struct PointObservations {
    pub point_name: String,
    pub specs: String,
    pub tolerance_minus: String,
    pub tolerance_plus: String,
    pub observations: Vec<Observation>,
    pub groups: Vec<ValueGroup>,
}

/// Per-point observations for a size, ordered by point name
///
/// A point missing from some pieces only loses those pieces' contributions.
pub fn point_observations(size: &SizeRecord, options: &DisplayOptions) -> Vec<PointObservations> {
    let mut by_point: BTreeMap<&str, (PointObservations, Vec<&MeasurementPoint>)> = BTreeMap::new();

    for pc in &size.pcs {
        for point in &pc.measurement_points {
            let (entry, points) = by_point.entry(point.point_name.as_str()).or_insert_with(|| {
                (
                    PointObservations {
                        point_name: point.point_name.clone(),
                        specs: point.specs.clone(),
                        tolerance_minus: tolerance_as_fraction_with(
                            point,
                            ToleranceSide::Minus,
                            options.denominator,
                        ),
                        tolerance_plus: tolerance_as_fraction_with(
                            point,
                            ToleranceSide::Plus,
                            options.denominator,
                        ),
                        observations: Vec::new(),
                        groups: Vec::new(),
                    },
                    Vec::new(),
                )
            });
            entry.observations.push(Observation {
                pc_number: pc.pc_number.clone(),
                value: display_value(point),
                result: effective_result(point),
                duplicated: pc.is_duplicated,
            });
            points.push(point);
        }
    }

    by_point
        .into_values()
        .map(|(mut obs, points)| {
            obs.groups = group_values(points);
            obs
        })
        .collect()
}

fn display_value(point: &MeasurementPoint) -> String {
    point
        .measured_value_fraction
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Group points by measured fraction with pass/fail counts
///
/// Points without a fraction are skipped. Groups are ordered by numeric value;
/// values that do not parse come last, in text order.
pub fn group_values<'a, I>(points: I) -> Vec<ValueGroup>
where
    I: IntoIterator<Item = &'a MeasurementPoint>,
{
    let mut groups: Vec<ValueGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in points {
        let Some(value) = point
            .measured_value_fraction
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            continue;
        };

        let slot = *index.entry(value.to_string()).or_insert_with(|| {
            groups.push(ValueGroup {
                value: value.to_string(),
                pass: 0,
                fail: 0,
            });
            groups.len() - 1
        });
        if effective_result(point).is_pass() {
            groups[slot].pass += 1;
        } else {
            groups[slot].fail += 1;
        }
    }

    sort_values(&mut groups, |g| g.value.as_str());
    groups
}

/// Order fraction strings by value, unparseable ones last
pub fn sort_values<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        match (fraction_to_decimal(ka).ok(), fraction_to_decimal(kb).ok()) {
            (Some(x), Some(y)) => x
                .partial_cmp(&y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ka.cmp(kb)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ka.cmp(kb),
        }
    });
}

/// One measurement in the cross-size point summary
#[derive(Debug, Clone, Serialize)]
pub struct PointMeasurement {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kvalue: Option<String>,
    pub pc_number: String,
    pub value: String,
    pub result: PointResult,
}

/// Cross-size summary entry for one point name
#[derive(Debug, Clone, Serialize)]
pub struct PointSummary {
    pub specs: String,
    pub tolerance_minus: String,
    pub tolerance_plus: String,
    pub measurements: Vec<PointMeasurement>,
}

/// Sizes matching an optional K-value filter
pub fn sizes_for_kvalue<'a>(
    sizes: &'a [SizeRecord],
    kvalue: Option<&'a str>,
) -> impl Iterator<Item = &'a SizeRecord> + 'a {
    sizes
        .iter()
        .filter(move |s| kvalue.map_or(true, |k| s.kvalue.as_deref() == Some(k)))
}

/// Merge every occurrence of each point name across sizes and pieces
///
/// Spec and tolerances come from the first occurrence of the point.
pub fn measurement_point_summary(
    sizes: &[SizeRecord],
    kvalue: Option<&str>,
    options: &DisplayOptions,
) -> BTreeMap<String, PointSummary> {
    let mut summary: BTreeMap<String, PointSummary> = BTreeMap::new();

    for size in sizes_for_kvalue(sizes, kvalue) {
        for pc in &size.pcs {
            for point in &pc.measurement_points {
                let entry = summary
                    .entry(point.point_name.clone())
                    .or_insert_with(|| PointSummary {
                        specs: point.specs.clone(),
                        tolerance_minus: tolerance_as_fraction_with(
                            point,
                            ToleranceSide::Minus,
                            options.denominator,
                        ),
                        tolerance_plus: tolerance_as_fraction_with(
                            point,
                            ToleranceSide::Plus,
                            options.denominator,
                        ),
                        measurements: Vec::new(),
                    });
                entry.measurements.push(PointMeasurement {
                    size: size.size.clone(),
                    kvalue: size.kvalue.clone(),
                    pc_number: pc.pc_number.clone(),
                    value: display_value(point),
                    result: effective_result(point),
                });
            }
        }
    }

    summary
}

/// Derive a size summary from the measured pieces
pub fn summarize_size(size: &SizeRecord) -> SizeSummary {
    let mut summary = SizeSummary {
        size: size.size.clone(),
        checked_pcs: size.pcs.len() as i64,
        ..Default::default()
    };

    for point in size.pcs.iter().flat_map(|pc| &pc.measurement_points) {
        summary.checked_points += 1;
        if effective_result(point).is_pass() {
            summary.total_pass += 1;
            continue;
        }
        summary.total_fail += 1;
        match evaluate_point(point).and_then(|v| v.failed_side()) {
            Some(ToleranceSide::Plus) => summary.plus_tolerance_fail_count += 1,
            Some(ToleranceSide::Minus) => summary.minus_tolerance_fail_count += 1,
            None => {}
        }
    }

    summary
}

/// Raw totals across size summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub checked_pcs: i64,
    pub checked_points: i64,
    pub total_pass: i64,
    pub total_fail: i64,
    pub plus_tolerance_fail_count: i64,
    pub minus_tolerance_fail_count: i64,
}

/// A stored summary whose pass + fail does not equal its checked points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryViolation {
    pub size: String,
    pub checked_points: i64,
    pub total_pass: i64,
    pub total_fail: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SummaryCheck {
    pub totals: SummaryTotals,
    pub violations: Vec<SummaryViolation>,
}

impl SummaryCheck {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Sum stored size summaries and report additivity violations as-is
pub fn check_size_summaries(summaries: &[SizeSummary]) -> SummaryCheck {
    let mut check = SummaryCheck::default();

    for s in summaries {
        check.totals.checked_pcs += s.checked_pcs;
        check.totals.checked_points += s.checked_points;
        check.totals.total_pass += s.total_pass;
        check.totals.total_fail += s.total_fail;
        check.totals.plus_tolerance_fail_count += s.plus_tolerance_fail_count;
        check.totals.minus_tolerance_fail_count += s.minus_tolerance_fail_count;

        if s.total_pass + s.total_fail != s.checked_points {
            tracing::warn!(
                size = %s.size,
                checked_points = s.checked_points,
                total_pass = s.total_pass,
                total_fail = s.total_fail,
                "size summary does not add up"
            );
            check.violations.push(SummaryViolation {
                size: s.size.clone(),
                checked_points: s.checked_points,
                total_pass: s.total_pass,
                total_fail: s.total_fail,
            });
        }
    }

    check
}

/// Record-level totals derived from measurements
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTotals {
    pub checked_pcs: i64,
    pub checked_points: i64,
    pub total_pass: i64,
    pub total_fail: i64,
    /// Percentage of passing points, rounded to two decimals
    pub pass_rate: f64,
}

pub fn record_totals(record: &InspectionRecord) -> RecordTotals {
    let mut totals = RecordTotals {
        checked_pcs: 0,
        checked_points: 0,
        total_pass: 0,
        total_fail: 0,
        pass_rate: 0.0,
    };
    for summary in record.sizes().iter().map(summarize_size) {
        totals.checked_pcs += summary.checked_pcs;
        totals.checked_points += summary.checked_points;
        totals.total_pass += summary.total_pass;
        totals.total_fail += summary.total_fail;
    }
    if totals.checked_points > 0 {
        let rate = totals.total_pass as f64 / totals.checked_points as f64 * 100.0;
        totals.pass_rate = (rate * 100.0).round() / 100.0;
    }
    totals
}

/// A point whose stored result disagrees with its tolerance window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMismatch {
    pub size: String,
    pub pc_number: String,
    pub point_name: String,
    pub stored: PointResult,
    pub evaluated: PointResult,
    pub deviation: f64,
}

/// Compare stored results against the tolerance evaluation
///
/// Points without a stored result or without a usable spec/measurement are
/// not reported.
pub fn check_point_results(record: &InspectionRecord) -> Vec<ResultMismatch> {
    let mut mismatches = Vec::new();
    for size in record.sizes() {
        for pc in &size.pcs {
            for point in &pc.measurement_points {
                let (Some(stored), Some(verdict)) = (point.result, evaluate_point(point)) else {
                    continue;
                };
                if stored != verdict.as_result() {
                    mismatches.push(ResultMismatch {
                        size: size.size.clone(),
                        pc_number: pc.pc_number.clone(),
                        point_name: point.point_name.clone(),
                        stored,
                        evaluated: verdict.as_result(),
                        deviation: verdict.deviation(),
                    });
                }
            }
        }
    }
    mismatches
}

/// Distinct K-values in first-seen order
pub fn kvalues(record: &InspectionRecord) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for k in record.sizes().iter().filter_map(|s| s.kvalue.as_ref()) {
        if !seen.contains(k) {
            seen.push(k.clone());
        }
    }
    seen
}

/// Copy measured pieces until the record shows `checkedQty` pieces
///
/// Only records with an actual wash quantity are expanded. Copies are taken
/// round-robin across all sizes, renumbered within their size and flagged as
/// duplicated. A `checkedQty` above [`MAX_EXPANDED_PIECES`] is capped.
pub fn expand_to_checked_qty(record: &InspectionRecord) -> InspectionRecord {
    let mut expanded = record.clone();
    if !record.is_actual_wash_qty {
        return expanded;
    }
    let Some(details) = expanded.measurement_details.as_mut() else {
        return expanded;
    };

    let requested = usize::try_from(record.checked_qty.unwrap_or(0).max(0)).unwrap_or(usize::MAX);
    let checked_qty = requested.min(MAX_EXPANDED_PIECES);
    if checked_qty < requested {
        tracing::warn!(
            record = %record.label(),
            checked_qty = requested,
            cap = MAX_EXPANDED_PIECES,
            "checked quantity too large to expand, capping"
        );
    }
    let measured: usize = details.measurement.iter().map(|s| s.pcs.len()).sum();
    if checked_qty <= measured {
        return expanded;
    }

    let templates: Vec<(usize, PieceRecord)> = details
        .measurement
        .iter()
        .enumerate()
        .flat_map(|(i, size)| size.pcs.iter().map(move |pc| (i, pc.clone())))
        .collect();
    if templates.is_empty() {
        return expanded;
    }

    for n in 0..(checked_qty - measured) {
        let (size_index, template) = &templates[n % templates.len()];
        let size = &mut details.measurement[*size_index];
        let mut copy = template.clone();
        copy.pc_number = (size.pcs.len() + 1).to_string();
        copy.is_duplicated = true;
        size.pcs.push(copy);
    }

    tracing::debug!(
        record = %record.label(),
        measured,
        checked_qty,
        "expanded measured pieces to checked quantity"
    );
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inspection::MeasurementDetails;

    fn mp(name: &str, measured: f64, fraction: &str, result: Option<PointResult>) -> MeasurementPoint {
        MeasurementPoint {
            point_name: name.to_string(),
            specs: "10".to_string(),
            tolerance_minus: Some(0.125),
            tolerance_plus: Some(0.125),
            measured_value_decimal: Some(measured),
            measured_value_fraction: Some(fraction.to_string()),
            result,
            ..Default::default()
        }
    }

    fn pc(n: &str, points: Vec<MeasurementPoint>) -> PieceRecord {
        PieceRecord {
            pc_number: n.to_string(),
            measurement_points: points,
            is_duplicated: false,
        }
    }

    fn size_m() -> SizeRecord {
        SizeRecord {
            size: "M".to_string(),
            kvalue: Some("K1".to_string()),
            pcs: vec![
                pc(
                    "1",
                    vec![
                        mp("Chest", 10.0, "10", Some(PointResult::Pass)),
                        mp("Waist", 10.25, "10 1/4", Some(PointResult::Fail)),
                    ],
                ),
                pc(
                    "2",
                    vec![
                        mp("Chest", 10.0, "10", Some(PointResult::Pass)),
                        mp("Waist", 9.75, "9 3/4", Some(PointResult::Fail)),
                    ],
                ),
                // Waist not on this piece's checklist
                pc("3", vec![mp("Chest", 10.0625, "10 1/16", Some(PointResult::Pass))]),
            ],
        }
    }

    #[test]
    fn test_point_observations_groups() {
        let obs = point_observations(&size_m(), &DisplayOptions::default());
        assert_eq!(obs.len(), 2);

        let chest = &obs[0];
        assert_eq!(chest.point_name, "Chest");
        assert_eq!(chest.observations.len(), 3);
        assert_eq!(chest.tolerance_plus, "1/8");
        assert_eq!(
            chest.groups,
            vec![
                ValueGroup { value: "10".to_string(), pass: 2, fail: 0 },
                ValueGroup { value: "10 1/16".to_string(), pass: 1, fail: 0 },
            ]
        );

        let waist = &obs[1];
        assert_eq!(waist.observations.len(), 2, "missing point is omitted, not failed");
        assert_eq!(waist.groups[0].value, "9 3/4");
        assert_eq!(waist.groups[1].value, "10 1/4");
        assert!(waist.groups.iter().all(|g| g.fail == 1 && g.pass == 0));
    }

    #[test]
    fn test_group_values_skips_missing_and_orders_numerically() {
        let mut missing = mp("Hem", 10.0, "", None);
        missing.measured_value_fraction = None;
        let points = vec![
            mp("Hem", 0.0, "+1/4", Some(PointResult::Fail)),
            mp("Hem", 0.0, "-1/16", Some(PointResult::Pass)),
            mp("Hem", 0.0, "odd", Some(PointResult::Pass)),
            mp("Hem", 0.0, "0", Some(PointResult::Pass)),
            missing,
        ];
        let groups = group_values(&points);
        let values: Vec<&str> = groups.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["-1/16", "0", "+1/4", "odd"]);
    }

    #[test]
    fn test_measurement_point_summary_merges_sizes() {
        let mut size_l = size_m();
        size_l.size = "L".to_string();
        size_l.kvalue = Some("K2".to_string());
        let sizes = vec![size_m(), size_l];

        let all = measurement_point_summary(&sizes, None, &DisplayOptions::default());
        assert_eq!(all["Chest"].measurements.len(), 6);
        assert_eq!(all["Waist"].measurements.len(), 4);
        assert_eq!(all["Chest"].specs, "10");

        let k2 = measurement_point_summary(&sizes, Some("K2"), &DisplayOptions::default());
        assert_eq!(k2["Chest"].measurements.len(), 3);
        assert!(k2["Chest"].measurements.iter().all(|m| m.size == "L"));
    }

    #[test]
    fn test_summarize_size_counts_sides() {
        let summary = summarize_size(&size_m());
        assert_eq!(summary.checked_pcs, 3);
        assert_eq!(summary.checked_points, 5);
        assert_eq!(summary.total_pass, 3);
        assert_eq!(summary.total_fail, 2);
        assert_eq!(summary.plus_tolerance_fail_count, 1);
        assert_eq!(summary.minus_tolerance_fail_count, 1);
        assert_eq!(summary.total_pass + summary.total_fail, summary.checked_points);
    }

    #[test]
    fn test_check_size_summaries_reports_raw() {
        let good = SizeSummary {
            size: "S".to_string(),
            checked_pcs: 2,
            checked_points: 10,
            total_pass: 8,
            total_fail: 2,
            plus_tolerance_fail_count: 1,
            minus_tolerance_fail_count: 1,
        };
        let bad = SizeSummary {
            size: "M".to_string(),
            checked_pcs: 2,
            checked_points: 10,
            total_pass: 9,
            total_fail: 3,
            ..Default::default()
        };
        let check = check_size_summaries(&[good, bad]);
        assert!(!check.is_consistent());
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].size, "M");
        // Totals are the raw sums, not corrected
        assert_eq!(check.totals.checked_points, 20);
        assert_eq!(check.totals.total_pass, 17);
        assert_eq!(check.totals.total_fail, 5);
    }

    #[test]
    fn test_record_totals_and_mismatches() {
        let mut size = size_m();
        // Stored pass that is actually out of tolerance
        size.pcs[2].measurement_points[0] = mp("Chest", 10.5, "10 1/2", Some(PointResult::Pass));
        let record = InspectionRecord {
            measurement_details: Some(MeasurementDetails {
                measurement: vec![size],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        };

        let totals = record_totals(&record);
        assert_eq!(totals.checked_points, 5);
        assert_eq!(totals.total_pass, 3);
        assert_eq!(totals.pass_rate, 60.0);

        let mismatches = check_point_results(&record);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].pc_number, "3");
        assert_eq!(mismatches[0].evaluated, PointResult::Fail);
    }

    #[test]
    fn test_expand_to_checked_qty() {
        let mut size_s = size_m();
        size_s.size = "S".to_string();
        size_s.pcs.truncate(1);
        let record = InspectionRecord {
            is_actual_wash_qty: true,
            checked_qty: Some(8),
            measurement_details: Some(MeasurementDetails {
                measurement: vec![size_m(), size_s],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        };

        let expanded = expand_to_checked_qty(&record);
        let sizes = expanded.sizes();
        let total: usize = sizes.iter().map(|s| s.pcs.len()).sum();
        assert_eq!(total, 8);
        // Four copies round-robin over M1, M2, M3, S1
        assert_eq!(sizes[0].pcs.len(), 6);
        assert_eq!(sizes[1].pcs.len(), 2);
        assert_eq!(sizes[0].pcs[5].pc_number, "6");
        assert!(sizes[0].pcs[5].is_duplicated);
        assert!(!sizes[0].pcs[0].is_duplicated);
        assert_eq!(sizes[1].pcs[1].pc_number, "2");
    }

    #[test]
    fn test_expand_caps_corrupt_checked_qty() {
        let record = InspectionRecord {
            is_actual_wash_qty: true,
            checked_qty: Some(1_000_000_000),
            measurement_details: Some(MeasurementDetails {
                measurement: vec![size_m()],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        };
        let expanded = expand_to_checked_qty(&record);
        assert_eq!(expanded.sizes()[0].pcs.len(), MAX_EXPANDED_PIECES);
    }

    #[test]
    fn test_expand_skips_estimated_records() {
        let record = InspectionRecord {
            is_actual_wash_qty: false,
            checked_qty: Some(50),
            measurement_details: Some(MeasurementDetails {
                measurement: vec![size_m()],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        };
        assert_eq!(expand_to_checked_qty(&record).sizes()[0].pcs.len(), 3);
    }

    #[test]
    fn test_kvalues_first_seen() {
        let mut other = size_m();
        other.kvalue = Some("K0".to_string());
        let record = InspectionRecord {
            measurement_details: Some(MeasurementDetails {
                measurement: vec![size_m(), other, size_m()],
                measurement_size_summary: vec![],
            }),
            ..Default::default()
        };
        assert_eq!(kvalues(&record), vec!["K1".to_string(), "K0".to_string()]);
    }
}
