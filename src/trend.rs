//! Monthly transaction trend within a date window

use polars::prelude::{col, IntoLazy, SortMultipleOptions};
use serde::{Serialize, Serializer};

use crate::data::{DateWindow, OrderRecord};
use crate::error::AnalyticsError;
use crate::frame::{self, order_frame, COL_ORDER_ID, COL_PAYMENT, COL_YEAR_MONTH};

/// Calendar year-month, ordered chronologically and displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Decode the `year * 100 + month` key used by the order frame
    fn from_key(key: i64) -> Self {
        Self {
            year: (key / 100) as i32,
            month: (key % 100) as u32,
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub year_month: YearMonth,
    /// Distinct orders purchased in the month
    pub orders: usize,
    /// Sum of every payment row in the month, installments included
    pub revenue: f64,
}

/// Monthly buckets plus the window-level headline figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub buckets: Vec<MonthlyBucket>,
    pub total_orders: usize,
    pub total_revenue: f64,
}

impl TrendSummary {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Month with the most orders, first one on ties
    pub fn peak_month(&self) -> Option<&MonthlyBucket> {
        self.buckets
            .iter()
            .reduce(|best, b| if b.orders > best.orders { b } else { best })
    }
}

/// Bucket in-window orders by calendar month.
///
/// Months without in-window rows get no bucket. An empty window yields no
/// buckets and zero totals.
///
/// # Arguments
/// * `orders` - All loaded order rows
/// * `window` - Inclusive purchase-date window
///
/// # Returns
/// Chronological monthly buckets plus the window's distinct order count and
/// total revenue
pub fn aggregate_trend(
    orders: &[OrderRecord],
    window: &DateWindow,
) -> Result<TrendSummary, AnalyticsError> {
    let df = order_frame(window.filter(orders))?;

    let monthly = df
        .clone()
        .lazy()
        .group_by([col(COL_YEAR_MONTH)])
        .agg([
            // Installment rows share an order id, so count ids once
            col(COL_ORDER_ID).n_unique().alias("orders"),
            col(COL_PAYMENT).sum().alias("revenue"),
        ])
        .sort([COL_YEAR_MONTH], SortMultipleOptions::default())
        .collect()?;

    let totals = df
        .lazy()
        .select([
            col(COL_ORDER_ID).n_unique().alias("orders"),
            col(COL_PAYMENT).sum().alias("revenue"),
        ])
        .collect()?;

    let months = frame::i64_values(&monthly, COL_YEAR_MONTH)?;
    let counts = frame::i64_values(&monthly, "orders")?;
    let revenue = frame::f64_values(&monthly, "revenue")?;

    let buckets: Vec<MonthlyBucket> = months
        .into_iter()
        .zip(counts)
        .zip(revenue)
        .map(|((key, orders), revenue)| MonthlyBucket {
            year_month: YearMonth::from_key(key),
            orders: orders as usize,
            revenue,
        })
        .collect();

    let total_orders = frame::i64_values(&totals, "orders")?.first().copied().unwrap_or(0) as usize;
    let total_revenue = frame::f64_values(&totals, "revenue")?.first().copied().unwrap_or(0.0);

    tracing::debug!(
        window = %window,
        months = buckets.len(),
        orders = total_orders,
        "trend aggregated"
    );

    Ok(TrendSummary {
        buckets,
        total_orders,
        total_revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_timestamp;
    use chrono::NaiveDate;

    fn order(id: &str, customer: &str, ts: &str, value: f64) -> OrderRecord {
        OrderRecord::new(id, customer, parse_timestamp(ts).unwrap(), value)
    }

    fn window(start: &str, end: &str) -> DateWindow {
        DateWindow::new(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_order_single_bucket() {
        let orders = vec![order("o1", "u1", "2018-06-15 12:00:00", 100.0)];
        let summary = aggregate_trend(&orders, &window("2018-01-01", "2018-12-31")).unwrap();

        assert_eq!(summary.buckets.len(), 1);
        let bucket = &summary.buckets[0];
        assert_eq!(bucket.year_month.to_string(), "2018-06");
        assert_eq!(bucket.orders, 1);
        assert_eq!(bucket.revenue, 100.0);
        assert_eq!(summary.total_orders, 1);
        assert_eq!(summary.total_revenue, 100.0);
    }

    #[test]
    fn test_installments_count_once_but_sum_fully() {
        let orders = vec![
            order("o1", "u1", "2018-03-02 09:00:00", 30.0),
            order("o1", "u1", "2018-03-02 09:00:00", 20.0),
            order("o2", "u2", "2018-03-20 18:30:00", 5.0),
        ];
        let summary = aggregate_trend(&orders, &window("2018-01-01", "2018-12-31")).unwrap();

        assert_eq!(summary.buckets.len(), 1);
        assert_eq!(summary.buckets[0].orders, 2);
        assert_eq!(summary.buckets[0].revenue, 55.0);
        assert_eq!(summary.total_orders, 2);
    }

    #[test]
    fn test_buckets_are_chronological_and_skip_empty_months() {
        let orders = vec![
            order("o3", "u1", "2018-02-10 10:00:00", 1.0),
            order("o1", "u2", "2017-11-05 10:00:00", 2.0),
            order("o2", "u3", "2017-12-24 10:00:00", 4.0),
            order("o4", "u3", "2018-05-01 10:00:00", 8.0),
        ];
        let summary = aggregate_trend(&orders, &window("2016-01-01", "2018-12-31")).unwrap();

        let labels: Vec<String> = summary
            .buckets
            .iter()
            .map(|b| b.year_month.to_string())
            .collect();
        assert_eq!(labels, vec!["2017-11", "2017-12", "2018-02", "2018-05"]);
    }

    #[test]
    fn test_rows_outside_window_are_ignored() {
        let orders = vec![
            order("o1", "u1", "2017-12-31 23:59:59", 10.0),
            order("o2", "u1", "2018-01-01 00:00:00", 20.0),
            order("o3", "u2", "2018-01-31 23:59:59", 40.0),
            order("o4", "u2", "2018-02-01 00:00:00", 80.0),
        ];
        let summary = aggregate_trend(&orders, &window("2018-01-01", "2018-01-31")).unwrap();

        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_revenue, 60.0);
        assert_eq!(summary.buckets.len(), 1);
    }

    #[test]
    fn test_empty_window_yields_zero_totals() {
        let orders = vec![order("o1", "u1", "2018-06-15 12:00:00", 100.0)];
        let summary = aggregate_trend(&orders, &window("2019-01-01", "2019-12-31")).unwrap();

        assert!(summary.is_empty());
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.total_revenue, 0.0);
        assert!(summary.peak_month().is_none());
    }

    #[test]
    fn test_bucket_counts_cover_total() {
        let orders: Vec<OrderRecord> = (0..30)
            .flat_map(|i| {
                let ts = format!("2017-{:02}-{:02} 08:00:00", i % 12 + 1, i % 28 + 1);
                let id = format!("o{i}");
                let customer = format!("u{}", i % 7);
                vec![
                    order(&id, &customer, &ts, i as f64),
                    order(&id, &customer, &ts, 1.0),
                ]
            })
            .collect();
        let window = window("2017-01-01", "2017-12-31");
        let summary = aggregate_trend(&orders, &window).unwrap();

        let bucket_total: usize = summary.buckets.iter().map(|b| b.orders).sum();
        assert_eq!(bucket_total, summary.total_orders);
        assert_eq!(summary.total_orders, 30);
        assert_eq!(summary.buckets.len(), 12);
        assert_eq!(summary, aggregate_trend(&orders, &window).unwrap());
    }

    #[test]
    fn test_peak_month() {
        let orders = vec![
            order("o1", "u1", "2018-01-10 10:00:00", 1.0),
            order("o2", "u2", "2018-02-10 10:00:00", 1.0),
            order("o3", "u3", "2018-02-11 10:00:00", 1.0),
        ];
        let summary = aggregate_trend(&orders, &window("2018-01-01", "2018-12-31")).unwrap();
        assert_eq!(summary.peak_month().unwrap().year_month.to_string(), "2018-02");
    }
}
