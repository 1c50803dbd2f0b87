//! Error taxonomy for dataset loading and the analytical components

use chrono::NaiveDate;
use thiserror::Error;

use crate::quantile::QuartileError;

/// The customer metric a quartile score was being computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Recency,
    Frequency,
    Monetary,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Metric::Recency => "recency",
            Metric::Frequency => "frequency",
            Metric::Monetary => "monetary",
        })
    }
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A row (or the header) does not match the expected schema
    #[error("data format error at line {line}: {message}")]
    DataFormat { line: u64, message: String },

    /// The window selects no rows, so there is no snapshot instant
    #[error("no orders between {start} and {end}")]
    InsufficientData { start: NaiveDate, end: NaiveDate },

    #[error("cannot compute {metric} quartiles: {source}")]
    QuantileComputation {
        metric: Metric,
        #[source]
        source: QuartileError,
    },

    #[error("invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl AnalyticsError {
    pub(crate) fn data_format(line: u64, message: impl Into<String>) -> Self {
        AnalyticsError::DataFormat {
            line,
            message: message.into(),
        }
    }
}
