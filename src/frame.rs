//! Columnar view of validated orders for the group-by aggregations

use chrono::Datelike;
use polars::prelude::*;

use crate::data::OrderRecord;

pub const COL_ORDER_ID: &str = "order_id";
pub const COL_CUSTOMER_ID: &str = "customer_unique_id";
/// Purchase instant as milliseconds since the Unix epoch
pub const COL_PURCHASED_AT: &str = "purchased_at";
/// Calendar month key, `year * 100 + month`
pub const COL_YEAR_MONTH: &str = "year_month";
pub const COL_PAYMENT: &str = "payment_value";

pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Build a DataFrame from already validated rows.
///
/// Timestamps become epoch milliseconds and every row carries its calendar
/// month key, so no temporal dtypes are needed downstream.
///
/// # Arguments
/// * `rows` - Order rows, typically one window's worth from [`crate::DateWindow::filter`]
///
/// # Returns
/// A frame with the `COL_*` columns, one row per payment line
pub fn order_frame<'a>(rows: impl IntoIterator<Item = &'a OrderRecord>) -> PolarsResult<DataFrame> {
    let mut order_ids = Vec::new();
    let mut customer_ids = Vec::new();
    let mut purchased_at = Vec::new();
    let mut year_months = Vec::new();
    let mut payments = Vec::new();

    for row in rows {
        order_ids.push(row.order_id.as_str());
        customer_ids.push(row.customer_id.as_str());
        purchased_at.push(row.purchased_at.and_utc().timestamp_millis());
        year_months.push(row.purchased_at.year() * 100 + row.purchased_at.month() as i32);
        payments.push(row.payment_value);
    }

    df!(
        COL_ORDER_ID => order_ids,
        COL_CUSTOMER_ID => customer_ids,
        COL_PURCHASED_AT => purchased_at,
        COL_YEAR_MONTH => year_months,
        COL_PAYMENT => payments,
    )
}

pub(crate) fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    Ok(df
        .column(name)?
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect())
}

/// Integer column of any width, widened to `i64`
pub(crate) fn i64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<i64>> {
    Ok(df
        .column(name)?
        .cast(&DataType::Int64)?
        .i64()?
        .into_no_null_iter()
        .collect())
}

pub(crate) fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(df
        .column(name)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_no_null_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::parse_timestamp;

    #[test]
    fn test_order_frame_columns() {
        let ts = parse_timestamp("2018-03-05 12:00:00").unwrap();
        let rows = vec![
            OrderRecord::new("o1", "u1", ts, 10.5),
            OrderRecord::new("o2", "u2", ts, 4.0),
        ];
        let frame = order_frame(&rows).unwrap();

        assert_eq!(frame.height(), 2);
        assert_eq!(str_values(&frame, COL_CUSTOMER_ID).unwrap(), vec!["u1", "u2"]);
        assert_eq!(i64_values(&frame, COL_YEAR_MONTH).unwrap(), vec![201803, 201803]);
        assert_eq!(
            i64_values(&frame, COL_PURCHASED_AT).unwrap()[0],
            ts.and_utc().timestamp_millis()
        );
        assert_eq!(f64_values(&frame, COL_PAYMENT).unwrap(), vec![10.5, 4.0]);
    }

    #[test]
    fn test_empty_frame_keeps_schema() {
        let frame = order_frame(&[]).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 5);
    }
}
