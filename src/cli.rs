//! Command-line interface definitions and argument parsing

use chrono::NaiveDate;
use clap::Parser;

use crate::data::DateWindow;
use crate::report::ReportOptions;

/// Transaction trend and RFM customer segmentation for an e-commerce dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, env = "SHOPFORGE_INPUT", default_value = "main_data.csv")]
    pub input: String,

    /// First day of the trend window (YYYY-MM-DD)
    #[arg(long, env = "SHOPFORGE_TREND_START", default_value = "2016-01-01")]
    pub trend_start: NaiveDate,

    /// Last day of the trend window, included in full
    #[arg(long, env = "SHOPFORGE_TREND_END", default_value = "2018-12-31")]
    pub trend_end: NaiveDate,

    /// First day of the RFM window (YYYY-MM-DD)
    #[arg(long, env = "SHOPFORGE_RFM_START", default_value = "2017-01-01")]
    pub rfm_start: NaiveDate,

    /// Last day of the RFM window, included in full
    #[arg(long, env = "SHOPFORGE_RFM_END", default_value = "2018-12-31")]
    pub rfm_end: NaiveDate,

    /// Number of customers in the top-spender table
    #[arg(short = 'n', long, env = "SHOPFORGE_TOP", default_value = "10")]
    pub top: usize,

    /// Base path for the chart PNGs; each chart appends its own suffix
    #[arg(short, long, env = "SHOPFORGE_OUTPUT", default_value = "dashboard.png")]
    pub output: String,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Validate both windows and bundle them with the table size
    pub fn report_options(&self) -> crate::Result<ReportOptions> {
        let trend_window = DateWindow::new(self.trend_start, self.trend_end)
            .map_err(|e| anyhow::anyhow!("Invalid trend window: {e}"))?;
        let rfm_window = DateWindow::new(self.rfm_start, self.rfm_end)
            .map_err(|e| anyhow::anyhow!("Invalid RFM window: {e}"))?;

        if self.top == 0 {
            anyhow::bail!("--top must be at least 1");
        }

        Ok(ReportOptions {
            trend_window,
            rfm_window,
            top_k: self.top,
        })
    }

    /// Path of one chart, derived from the `--output` base path
    pub fn chart_path(&self, suffix: &str) -> String {
        let base = self.output.strip_suffix(".png").unwrap_or(&self.output);
        format!("{base}_{suffix}.png")
    }
}
