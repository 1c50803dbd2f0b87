//! ShopForge: transaction trend and RFM customer segmentation for e-commerce data
//!
//! This library loads an order-level transactions dataset, aggregates it into
//! monthly order and revenue buckets, and scores customers by Recency,
//! Frequency and Monetary value to place them in Loyal, Potential or At Risk
//! segments.

pub mod cli;
pub mod data;
pub mod error;
pub mod frame;
pub mod quantile;
pub mod report;
pub mod rfm;
pub mod trend;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{Dataset, DateWindow, OrderRecord};
pub use error::{AnalyticsError, Metric};
pub use report::{build_report, DashboardReport, ReportOptions, SegmentationOutcome};
pub use rfm::{classify, segment_customers, CustomerRfm, Segment};
pub use trend::{aggregate_trend, MonthlyBucket, TrendSummary};

/// Result type for the CLI and rendering glue
pub type Result<T> = anyhow::Result<T>;
