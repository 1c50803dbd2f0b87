//! Order dataset loading, typed schema validation and date windows

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::AnalyticsError;

/// Columns the loader requires; everything else in the file is passthrough.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    "order_id",
    "customer_unique_id",
    "order_purchase_timestamp",
    "payment_value",
];

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// One payment line of an order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Order identifier, repeated across payment installments
    pub order_id: String,
    /// Identifies a real-world customer across repeat orders
    pub customer_id: String,
    pub purchased_at: NaiveDateTime,
    /// Payment amount in Brazilian reais (R$)
    pub payment_value: f64,
}

impl OrderRecord {
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        purchased_at: NaiveDateTime,
        payment_value: f64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            purchased_at,
            payment_value,
        }
    }
}

/// Raw CSV row before validation
#[derive(Debug, Deserialize)]
struct RawOrderRow {
    order_id: Option<String>,
    customer_unique_id: Option<String>,
    order_purchase_timestamp: Option<String>,
    payment_value: Option<String>,
}

impl RawOrderRow {
    fn validate(self, line: u64) -> Result<OrderRecord, AnalyticsError> {
        let order_id = required(self.order_id, "order_id", line)?;
        let customer_id = required(self.customer_unique_id, "customer_unique_id", line)?;
        let raw_ts = required(self.order_purchase_timestamp, "order_purchase_timestamp", line)?;
        let raw_payment = required(self.payment_value, "payment_value", line)?;

        let purchased_at = parse_timestamp(&raw_ts).ok_or_else(|| {
            AnalyticsError::data_format(line, format!("unparseable timestamp '{raw_ts}'"))
        })?;

        let payment_value: f64 = raw_payment.trim().parse().map_err(|_| {
            AnalyticsError::data_format(line, format!("unparseable payment_value '{raw_payment}'"))
        })?;
        if !payment_value.is_finite() || payment_value < 0.0 {
            return Err(AnalyticsError::data_format(
                line,
                format!("payment_value must be a non-negative amount, got {payment_value}"),
            ));
        }

        Ok(OrderRecord {
            order_id,
            customer_id,
            purchased_at,
            payment_value,
        })
    }
}

fn required(value: Option<String>, column: &str, line: u64) -> Result<String, AnalyticsError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(AnalyticsError::data_format(line, format!("missing {column}"))),
    }
}

/// Parse a purchase timestamp; a bare date means midnight
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read-only handle over the loaded orders.
///
/// Cloning is cheap and clones share the same rows, so one loaded dataset
/// can back any number of independent computations.
#[derive(Debug, Clone)]
pub struct Dataset {
    orders: Arc<[OrderRecord]>,
}

impl Dataset {
    pub fn from_records(records: Vec<OrderRecord>) -> Self {
        Self {
            orders: records.into(),
        }
    }

    /// Load and validate a CSV file
    ///
    /// # Arguments
    /// * `path` - CSV with at least the columns in [`REQUIRED_COLUMNS`]
    ///
    /// # Returns
    /// The validated dataset, or the first row error encountered
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnalyticsError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    /// Load and validate CSV content from any reader.
    ///
    /// The first malformed row aborts the load; no partially loaded
    /// dataset is ever returned.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AnalyticsError> {
        // Short rows deserialize with the trailing fields absent, so they are
        // reported as missing columns at their line instead of a CSV error
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(AnalyticsError::data_format(1, format!("missing column '{column}'")));
            }
        }

        let mut records = Vec::new();
        let mut row = csv::StringRecord::new();
        while reader.read_record(&mut row)? {
            let line = row.position().map_or(0, |p| p.line());
            let raw: RawOrderRow = row
                .deserialize(Some(&headers))
                .map_err(|e| AnalyticsError::data_format(line, e.to_string()))?;
            records.push(raw.validate(line)?);
        }

        Ok(Self::from_records(records))
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the timestamp falls on a day inside the window; the end day
    /// is included in full.
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        let day = ts.date();
        self.start <= day && day <= self.end
    }

    pub fn filter<'a>(&self, orders: &'a [OrderRecord]) -> impl Iterator<Item = &'a OrderRecord> {
        let window = *self;
        orders.iter().filter(move |o| window.contains(&o.purchased_at))
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
