//! Dashboard projections over the trend and segmentation results

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{Dataset, DateWindow};
use crate::error::AnalyticsError;
use crate::rfm::{segment_customers, CustomerRfm, Segment};
use crate::trend::{aggregate_trend, TrendSummary};

/// Population and revenue share of one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customers: usize,
    pub customer_pct: f64,
    pub revenue: f64,
    pub revenue_pct: f64,
}

/// Summaries for every segment, in `Segment::ALL` order, including empty ones
pub fn segment_summary(records: &[CustomerRfm]) -> Vec<SegmentSummary> {
    let total_customers = records.len();
    let total_revenue: f64 = records.iter().map(|r| r.monetary).sum();

    Segment::ALL
        .iter()
        .map(|&segment| {
            let members = records.iter().filter(|r| r.segment == segment);
            let (customers, revenue) = members.fold((0, 0.0), |(n, sum), r| (n + 1, sum + r.monetary));
            SegmentSummary {
                segment,
                customers,
                customer_pct: percentage(customers as f64, total_customers as f64),
                revenue,
                revenue_pct: percentage(revenue, total_revenue),
            }
        })
        .collect()
}

/// The `k` biggest spenders, ties in customer id order
pub fn top_customers(records: &[CustomerRfm], k: usize) -> Vec<CustomerRfm> {
    let mut sorted: Vec<&CustomerRfm> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.monetary
            .total_cmp(&a.monetary)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    sorted.into_iter().take(k).cloned().collect()
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part * 100.0 / whole
    }
}

/// Ready-to-render segmentation results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segmentation {
    pub total_customers: usize,
    pub summary: Vec<SegmentSummary>,
    pub top_customers: Vec<CustomerRfm>,
    pub customers: Vec<CustomerRfm>,
}

/// Segmentation result as the presentation layer needs to tell it apart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SegmentationOutcome {
    Ready(Segmentation),
    /// The window selects no orders
    Empty,
    /// Too few customers or too little spread to score quartiles
    Degraded { reason: String },
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub trend_window: DateWindow,
    pub rfm_window: DateWindow,
    pub top_k: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            trend_window: calendar_years(2016, 2018),
            rfm_window: calendar_years(2017, 2018),
            top_k: 10,
        }
    }
}

/// January 1st of `first` through December 31st of `last`
fn calendar_years(first: i32, last: i32) -> DateWindow {
    let start = NaiveDate::from_ymd_opt(first, 1, 1).expect("valid calendar date");
    let end = NaiveDate::from_ymd_opt(last, 12, 31).expect("valid calendar date");
    DateWindow::new(start, end).expect("first year precedes last")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub trend_window: DateWindow,
    pub trend: TrendSummary,
    pub rfm_window: DateWindow,
    pub segmentation: SegmentationOutcome,
}

/// Run both analyses over their own windows.
///
/// Empty and degraded segmentation are folded into the outcome; any other
/// error is returned.
///
/// # Arguments
/// * `dataset` - Loaded orders, shared read-only by both analyses
/// * `options` - Trend window, RFM window and top-K size
///
/// # Returns
/// The trend summary and the segmentation outcome for their windows
pub fn build_report(dataset: &Dataset, options: &ReportOptions) -> Result<DashboardReport, AnalyticsError> {
    let trend = aggregate_trend(dataset.orders(), &options.trend_window)?;

    let segmentation = match segment_customers(dataset.orders(), &options.rfm_window) {
        Ok(customers) => SegmentationOutcome::Ready(Segmentation {
            total_customers: customers.len(),
            summary: segment_summary(&customers),
            top_customers: top_customers(&customers, options.top_k),
            customers,
        }),
        Err(AnalyticsError::InsufficientData { .. }) => SegmentationOutcome::Empty,
        Err(err @ AnalyticsError::QuantileComputation { .. }) => {
            tracing::warn!(window = %options.rfm_window, error = %err, "segmentation degraded");
            SegmentationOutcome::Degraded {
                reason: err.to_string(),
            }
        }
        Err(err) => return Err(err),
    };

    Ok(DashboardReport {
        trend_window: options.trend_window,
        trend,
        rfm_window: options.rfm_window,
        segmentation,
    })
}
