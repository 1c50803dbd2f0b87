//! Console report and chart rendering using Plotters

use plotters::prelude::*;

use crate::report::{DashboardReport, Segmentation, SegmentationOutcome};
use crate::rfm::Segment;
use crate::trend::TrendSummary;

/// Bar colors per segment, in `Segment::ALL` order
const SEGMENT_COLORS: [RGBColor; 3] = [GREEN, BLUE, RED];

fn segment_color(segment: Segment) -> RGBColor {
    match segment {
        Segment::Loyal => SEGMENT_COLORS[0],
        Segment::Potential => SEGMENT_COLORS[1],
        Segment::AtRisk => SEGMENT_COLORS[2],
    }
}

/// Category label for an x position, blank between categories
fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Upper bound of the y axis with headroom above the tallest value
fn y_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Group digits in thousands: 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format an amount in reais rounded to whole units
pub fn format_currency(amount: f64) -> String {
    format!("R$ {}", group_thousands(amount.max(0.0).round() as u64))
}

/// Line chart of distinct orders per month
///
/// # Arguments
/// * `trend` - Monthly buckets to plot; an empty trend is an error
/// * `output_path` - PNG file to write
pub fn create_monthly_orders_chart(trend: &TrendSummary, output_path: &str) -> crate::Result<()> {
    if trend.is_empty() {
        anyhow::bail!("No monthly buckets to plot");
    }

    let labels: Vec<String> = trend.buckets.iter().map(|b| b.year_month.to_string()).collect();
    let n = labels.len();
    let y_max = y_ceiling(trend.buckets.iter().map(|b| b.orders as f64));

    let root = BitMapBackend::new(output_path, (1000, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Orders", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(n.div_ceil(3).max(2))
        .x_label_formatter(&|x| label_at(&labels, *x))
        .y_desc("Number of Orders")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(f64, f64)> = trend
        .buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (i as f64, b.orders as f64))
        .collect();

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, BLUE.filled())))?;

    root.present()?;
    tracing::info!(path = output_path, "monthly orders chart saved");

    Ok(())
}

/// Bar chart of revenue per month
///
/// # Arguments
/// * `trend` - Monthly buckets to plot; an empty trend is an error
/// * `output_path` - PNG file to write
pub fn create_monthly_revenue_chart(trend: &TrendSummary, output_path: &str) -> crate::Result<()> {
    if trend.is_empty() {
        anyhow::bail!("No monthly buckets to plot");
    }

    let labels: Vec<String> = trend.buckets.iter().map(|b| b.year_month.to_string()).collect();
    let n = labels.len();
    let y_max = y_ceiling(trend.buckets.iter().map(|b| b.revenue));

    let root = BitMapBackend::new(output_path, (1000, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Revenue", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(n.div_ceil(3).max(2))
        .x_label_formatter(&|x| label_at(&labels, *x))
        .y_desc("Revenue (R$)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(trend.buckets.iter().enumerate().map(|(i, b)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, b.revenue)], BLUE.filled())
    }))?;

    root.present()?;
    tracing::info!(path = output_path, "monthly revenue chart saved");

    Ok(())
}

/// Bar chart of one per-segment value, e.g. customer count or revenue
fn create_segment_chart(
    segmentation: &Segmentation,
    output_path: &str,
    title: &str,
    y_desc: &str,
    value: impl Fn(&crate::report::SegmentSummary) -> f64,
) -> crate::Result<()> {
    let labels: Vec<String> = segmentation
        .summary
        .iter()
        .map(|s| s.segment.to_string())
        .collect();
    let y_max = y_ceiling(segmentation.summary.iter().map(&value));

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(labels.len() as f64 - 0.5), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, summary) in segmentation.summary.iter().enumerate() {
        let x = i as f64;
        let color = segment_color(summary.segment);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, value(summary))],
            color.filled(),
        )))?;
    }

    root.present()?;
    tracing::info!(path = output_path, chart = title, "segment chart saved");

    Ok(())
}

/// Customers per segment
///
/// # Arguments
/// * `segmentation` - Scored customers and their per-segment summary
/// * `output_path` - PNG file to write
pub fn create_segment_distribution_chart(segmentation: &Segmentation, output_path: &str) -> crate::Result<()> {
    create_segment_chart(
        segmentation,
        output_path,
        "Customer Segment Distribution",
        "Number of Customers",
        |s| s.customers as f64,
    )
}

/// Revenue contributed by each segment
///
/// # Arguments
/// * `segmentation` - Scored customers and their per-segment summary
/// * `output_path` - PNG file to write
pub fn create_segment_revenue_chart(segmentation: &Segmentation, output_path: &str) -> crate::Result<()> {
    create_segment_chart(
        segmentation,
        output_path,
        "Revenue Contribution by Segment",
        "Total Revenue (R$)",
        |s| s.revenue,
    )
}

/// Print the trend KPIs and monthly table to console
pub fn print_trend_summary(report: &DashboardReport) {
    let trend = &report.trend;
    let window = &report.trend_window;

    println!("\n=== Transaction Trend ({window}) ===");
    println!("Total orders:  {}", group_thousands(trend.total_orders as u64));
    println!("Total revenue: {}", format_currency(trend.total_revenue));

    if trend.is_empty() {
        println!("\nNo orders in this window.");
        return;
    }

    if let Some(peak) = trend.peak_month() {
        println!("Busiest month: {} ({} orders)", peak.year_month, group_thousands(peak.orders as u64));
    }

    println!("\n  Month   |   Orders | Revenue");
    println!("  --------|----------|----------------");
    for bucket in &trend.buckets {
        println!(
            "  {} | {:>8} | {}",
            bucket.year_month,
            group_thousands(bucket.orders as u64),
            format_currency(bucket.revenue)
        );
    }
}

/// Print segment distribution and the top-spender table to console
pub fn print_segmentation(report: &DashboardReport) {
    println!("\n=== Customer Segmentation RFM ({}) ===", report.rfm_window);

    let segmentation = match &report.segmentation {
        SegmentationOutcome::Ready(segmentation) => segmentation,
        SegmentationOutcome::Empty => {
            println!("Total customers: 0");
            println!("No orders in this window; nothing to segment.");
            return;
        }
        SegmentationOutcome::Degraded { reason } => {
            println!("Segmentation unavailable: {reason}");
            println!("Try widening the RFM window.");
            return;
        }
    };

    println!("Total customers: {}", group_thousands(segmentation.total_customers as u64));

    println!("\n  Segment   | Customers |      % | Revenue          |      %");
    println!("  ----------|-----------|--------|------------------|-------");
    for s in &segmentation.summary {
        println!(
            "  {:<9} | {:>9} | {:>5.1}% | {:<16} | {:>5.1}%",
            s.segment,
            group_thousands(s.customers as u64),
            s.customer_pct,
            format_currency(s.revenue),
            s.revenue_pct
        );
    }

    println!("\nTop {} customers by monetary value:", segmentation.top_customers.len());
    println!("  Customer                         | Monetary         | R F M | Segment");
    println!("  ---------------------------------|------------------|-------|----------");
    for c in &segmentation.top_customers {
        println!(
            "  {:<32} | {:<16} | {} {} {} | {}",
            c.customer_id,
            format_currency(c.monetary),
            c.r_score,
            c.f_score,
            c.m_score,
            c.segment
        );
    }
}

/// Render every chart the report supports next to `chart_path(suffix)`.
///
/// Charts without data are skipped with a warning.
///
/// # Arguments
/// * `report` - Combined trend and segmentation report
/// * `chart_path` - Maps a chart suffix such as `"monthly_orders"` to a file path
///
/// # Returns
/// Paths of the charts actually written
pub fn generate_visualization_report(
    report: &DashboardReport,
    chart_path: impl Fn(&str) -> String,
) -> crate::Result<Vec<String>> {
    let mut written = Vec::new();

    if report.trend.is_empty() {
        tracing::warn!(window = %report.trend_window, "no trend data, skipping monthly charts");
    } else {
        let path = chart_path("orders");
        create_monthly_orders_chart(&report.trend, &path)?;
        written.push(path);

        let path = chart_path("revenue");
        create_monthly_revenue_chart(&report.trend, &path)?;
        written.push(path);
    }

    if let SegmentationOutcome::Ready(segmentation) = &report.segmentation {
        let path = chart_path("segments");
        create_segment_distribution_chart(segmentation, &path)?;
        written.push(path);

        let path = chart_path("segment_revenue");
        create_segment_revenue_chart(segmentation, &path)?;
        written.push(path);
    } else {
        tracing::warn!(window = %report.rfm_window, "no segmentation, skipping segment charts");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse_timestamp, DateWindow, OrderRecord};
    use crate::trend::aggregate_trend;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(99441), "99,441");
        assert_eq!(group_thousands(16008872), "16,008,872");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.56), "R$ 1,235");
        assert_eq!(format_currency(0.0), "R$ 0");
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["2018-01".to_string(), "2018-02".to_string()];
        assert_eq!(label_at(&labels, 0.0), "2018-01");
        assert_eq!(label_at(&labels, 1.0), "2018-02");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, -1.0), "");
        assert_eq!(label_at(&labels, 7.0), "");
    }

    #[test]
    fn test_y_ceiling() {
        assert_eq!(y_ceiling([10.0, 50.0].into_iter()), 50.0 * 1.1);
        assert_eq!(y_ceiling(std::iter::empty()), 1.0);
    }

    #[test]
    fn test_empty_trend_is_not_plotted() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        )
        .unwrap();
        let orders = vec![OrderRecord::new(
            "o1",
            "u1",
            parse_timestamp("2017-05-05 10:00:00").unwrap(),
            10.0,
        )];
        let trend = aggregate_trend(&orders, &window).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.png");
        let path = path.to_str().unwrap();
        assert!(create_monthly_orders_chart(&trend, path).is_err());
        assert!(create_monthly_revenue_chart(&trend, path).is_err());
        assert!(!std::path::Path::new(path).exists());
    }
}
