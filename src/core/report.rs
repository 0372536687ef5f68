//! Report assembly
//!
//! Collects every derived value for one inspection record into a single
//! serializable document, the input a PDF renderer lays out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::aggregate::{
    check_point_results, check_size_summaries, expand_to_checked_qty, kvalues,
    measurement_point_summary, point_observations, record_totals, summarize_size,
    PointObservations, PointSummary, RecordTotals, ResultMismatch, SummaryCheck,
};
use crate::core::assets::{collect_image_refs, resolve_image_ref};
use crate::core::compare::{compare_with_counterparts, RecordComparison};
use crate::core::wash::{
    compute_wash_progress_with, resolve_display_wash_qty, RealWashQtyLookup, WashProgress,
    WashQtyResolution, WashQtyView,
};
use crate::core::DisplayOptions;
use crate::entities::inspection::{InspectionRecord, SizeSummary};

/// PDF file name for a record, e.g. `QC_Washing_Report_GPAR1234_NAVY.pdf`
pub fn report_file_name(record: &InspectionRecord) -> String {
    let clean = |s: &str| s.trim().replace(['/', '\\'], "_");
    format!(
        "QC_Washing_Report_{}_{}.pdf",
        clean(&record.order_no),
        clean(&record.color)
    )
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub view: WashQtyView,
    /// Duplicate measured pieces up to the checked quantity
    pub show_all_pcs: bool,
    pub display: DisplayOptions,
    pub match_window_secs: i64,
    pub api_base_url: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            view: WashQtyView::Estimated,
            show_all_pcs: false,
            display: DisplayOptions::default(),
            match_window_secs: crate::core::wash::DEFAULT_MATCH_WINDOW_SECS,
            api_base_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportHeader {
    pub id: Option<String>,
    pub order_no: String,
    pub color: String,
    pub buyer: String,
    pub wash_type: String,
    pub report_type: String,
    pub factory_name: String,
    pub before_after_wash: String,
    pub color_order_qty: Option<i64>,
    pub checked_qty: Option<i64>,
    pub overall_final_result: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeSection {
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kvalue: Option<String>,
    pub summary: SizeSummary,
    pub points: Vec<PointObservations>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageEntry {
    pub reference: String,
    pub resolved: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QcReport {
    pub file_name: String,
    pub generated_at: DateTime<Utc>,
    pub header: ReportHeader,
    pub wash_qty: WashQtyResolution,
    pub progress: WashProgress,
    pub totals: RecordTotals,
    pub stored_summary_check: SummaryCheck,
    pub kvalues: Vec<String>,
    pub sizes: Vec<SizeSection>,
    pub point_summary: BTreeMap<String, PointSummary>,
    pub result_mismatches: Vec<ResultMismatch>,
    pub comparison: RecordComparison,
    pub images: Vec<ImageEntry>,
}

/// Build the full report for `record` against its peers in `all`
pub fn build_report(
    record: &InspectionRecord,
    all: &[InspectionRecord],
    lookup: &dyn RealWashQtyLookup,
    options: &ReportOptions,
    now: DateTime<Utc>,
) -> QcReport {
    let shown = if options.show_all_pcs {
        expand_to_checked_qty(record)
    } else {
        record.clone()
    };

    let sizes = shown
        .sizes()
        .iter()
        .map(|size| SizeSection {
            size: size.size.clone(),
            kvalue: size.kvalue.clone(),
            summary: summarize_size(size),
            points: point_observations(size, &options.display),
        })
        .collect();

    let images = [&record.defect_details, &record.inspection_details]
        .into_iter()
        .flatten()
        .flat_map(collect_image_refs)
        .filter_map(|r| {
            let reference = r.raw_url()?;
            Some(ImageEntry {
                resolved: resolve_image_ref(&r, &options.api_base_url),
                reference,
            })
        })
        .collect();

    QcReport {
        file_name: report_file_name(record),
        generated_at: now,
        header: ReportHeader {
            id: record.id.clone(),
            order_no: record.order_no.clone(),
            color: record.color.clone(),
            buyer: record.buyer.clone(),
            wash_type: record.wash_type.clone(),
            report_type: record.report_type.clone(),
            factory_name: record.factory_name.clone(),
            before_after_wash: record.before_after_wash.clone(),
            color_order_qty: record.color_order_qty,
            checked_qty: record.checked_qty,
            overall_final_result: record.overall_final_result.clone(),
            created_at: record.created_at,
        },
        wash_qty: resolve_display_wash_qty(record, options.view, lookup),
        progress: compute_wash_progress_with(record, all, options.match_window_secs),
        totals: record_totals(&shown),
        stored_summary_check: check_size_summaries(record.size_summaries()),
        kvalues: kvalues(record),
        sizes,
        point_summary: measurement_point_summary(shown.sizes(), None, &options.display),
        result_mismatches: check_point_results(record),
        comparison: compare_with_counterparts(record, all, &options.display),
        images,
    }
}
