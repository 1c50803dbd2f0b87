//! RFM (Recency, Frequency, Monetary) scoring and customer segmentation

use chrono::{Duration, NaiveDateTime};
use polars::prelude::{col, IntoLazy, SortMultipleOptions};
use serde::Serialize;

use crate::data::{DateWindow, OrderRecord};
use crate::error::{AnalyticsError, Metric};
use crate::frame::{
    self, order_frame, COL_CUSTOMER_ID, COL_ORDER_ID, COL_PAYMENT, COL_PURCHASED_AT, MILLIS_PER_DAY,
};
use crate::quantile::{quartile_bins, rank_first};

/// Customer classification derived from the R and F scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Segment {
    Loyal,
    Potential,
    #[serde(rename = "At Risk")]
    AtRisk,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Loyal, Segment::Potential, Segment::AtRisk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Loyal => "Loyal",
            Segment::Potential => "Potential",
            Segment::AtRisk => "At Risk",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Classify a customer from its recency and frequency scores.
///
/// Rules, first match wins:
/// - **Loyal**: `r_score == 4` and `f_score >= 3`
/// - **Potential**: `r_score >= 3`
/// - **At Risk**: everything else
pub fn classify(r_score: u8, f_score: u8) -> Segment {
    if r_score == 4 && f_score >= 3 {
        Segment::Loyal
    } else if r_score >= 3 {
        Segment::Potential
    } else {
        Segment::AtRisk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Whole days from the last in-window purchase to the snapshot instant
    pub recency: i64,
    /// Distinct orders in the window
    pub frequency: usize,
    /// Sum of payments in the window
    pub monetary: f64,
    pub r_score: u8,
    pub f_score: u8,
    pub m_score: u8,
    pub segment: Segment,
}

/// Reference "now" for recency: one day after the latest in-window purchase
pub fn snapshot_instant(orders: &[OrderRecord], window: &DateWindow) -> Option<NaiveDateTime> {
    window
        .filter(orders)
        .map(|o| o.purchased_at)
        .max()
        .map(|latest| latest + Duration::days(1))
}

/// Score and segment every customer with at least one in-window order.
///
/// Records come back sorted by customer id; frequency ties are broken in
/// that same order before quartile scoring. Recency and monetary are scored
/// on raw values, so tied customers always share a score there.
///
/// # Arguments
/// * `orders` - All loaded order rows
/// * `window` - Inclusive purchase-date window; rows outside it are ignored
///
/// # Returns
/// One [`CustomerRfm`] per in-window customer, in customer id order
///
/// # Errors
/// * `InsufficientData` if the window selects no rows
/// * `QuantileComputation` if there are fewer than four customers or a
///   metric is too concentrated to form four distinct quartiles
pub fn segment_customers(
    orders: &[OrderRecord],
    window: &DateWindow,
) -> Result<Vec<CustomerRfm>, AnalyticsError> {
    let snapshot = snapshot_instant(orders, window).ok_or(AnalyticsError::InsufficientData {
        start: window.start(),
        end: window.end(),
    })?;

    let snapshot_ms = snapshot.and_utc().timestamp_millis();

    let rfm = order_frame(window.filter(orders))?
        .lazy()
        .group_by([col(COL_CUSTOMER_ID)])
        .agg([
            col(COL_PURCHASED_AT).max().alias("last_purchase"),
            col(COL_ORDER_ID).n_unique().alias("frequency"),
            col(COL_PAYMENT).sum().alias("monetary"),
        ])
        // Customer order is the output order and the frequency tie-break
        .sort([COL_CUSTOMER_ID], SortMultipleOptions::default())
        .collect()?;

    let ids = frame::str_values(&rfm, COL_CUSTOMER_ID)?;
    let recency: Vec<i64> = frame::i64_values(&rfm, "last_purchase")?
        .into_iter()
        .map(|last| (snapshot_ms - last) / MILLIS_PER_DAY)
        .collect();
    let frequency: Vec<usize> = frame::i64_values(&rfm, "frequency")?
        .into_iter()
        .map(|f| f as usize)
        .collect();
    let monetary = frame::f64_values(&rfm, "monetary")?;

    let recency_values: Vec<f64> = recency.iter().map(|&d| d as f64).collect();
    let frequency_values: Vec<f64> = frequency.iter().map(|&f| f as f64).collect();

    let r_bins = score(Metric::Recency, &recency_values)?;
    let f_bins = score(Metric::Frequency, &rank_first(&frequency_values))?;
    let m_bins = score(Metric::Monetary, &monetary)?;

    let records: Vec<CustomerRfm> = (0..ids.len())
        .map(|i| {
            // Smallest recency is the most recent customer, so invert
            let r_score = 5 - r_bins[i];
            let f_score = f_bins[i];
            CustomerRfm {
                customer_id: ids[i].clone(),
                recency: recency[i],
                frequency: frequency[i],
                monetary: monetary[i],
                r_score,
                f_score,
                m_score: m_bins[i],
                segment: classify(r_score, f_score),
            }
        })
        .collect();

    tracing::debug!(
        window = %window,
        snapshot = %snapshot,
        customers = records.len(),
        "customers segmented"
    );

    Ok(records)
}

fn score(metric: Metric, values: &[f64]) -> Result<Vec<u8>, AnalyticsError> {
    quartile_bins(values).map_err(|source| AnalyticsError::QuantileComputation { metric, source })
}
