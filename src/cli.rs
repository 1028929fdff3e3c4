use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{data::parse_naive_date, filter::FilterSpec};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean sales extracts and derive KPI, trend, and breakdown reports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the first rows of the raw upload, all original columns included
    Preview(PreviewArgs),
    /// Show which source column was detected for each canonical field
    Columns(ColumnsArgs),
    /// Clean, filter, and print the dataset summary and every report
    Report(ReportArgs),
    /// Export the report set as a workbook or the filtered rows as CSV
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Sales file to analyze (CSV/TSV, or xlsx/xlsm/xlsb/xls/ods)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Worksheet name or 0-based index for spreadsheet input (defaults to the first)
    #[arg(long)]
    pub sheet: Option<String>,
    /// YAML file overriding column candidates and the upload size limit
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Earliest order date to include (inclusive)
    #[arg(long = "start")]
    pub start: Option<String>,
    /// Latest order date to include (inclusive)
    #[arg(long = "end")]
    pub end: Option<String>,
    /// Restrict to these regions (repeat the flag for several; empty means all)
    #[arg(long = "region", action = clap::ArgAction::Append)]
    pub regions: Vec<String>,
    /// Restrict to these products (repeat the flag for several; empty means all)
    #[arg(long = "product", action = clap::ArgAction::Append)]
    pub products: Vec<String>,
}

impl FilterArgs {
    pub fn to_spec(&self) -> Result<FilterSpec> {
        let start = parse_bound(self.start.as_deref(), "--start")?;
        let end = parse_bound(self.end.as_deref(), "--end")?;
        let mut spec = FilterSpec::new();
        if start.is_some() || end.is_some() {
            spec = spec.with_date_range(start, end);
        }
        let regions = clean_selection(&self.regions);
        if !regions.is_empty() {
            spec = spec.with_regions(regions);
        }
        let products = clean_selection(&self.products);
        if !products.is_empty() {
            spec = spec.with_products(products);
        }
        Ok(spec)
    }
}

fn parse_bound(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse_naive_date(v).with_context(|| format!("Invalid date '{v}' for {flag}")))
        .transpose()
}

fn clean_selection(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 50)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of filtered rows to preview before the reports
    #[arg(long, default_value_t = 100)]
    pub rows: usize,
    /// Number of products listed in the top-products table
    #[arg(long = "top", default_value_t = 20)]
    pub top: usize,
    /// Emit the summary and report set as JSON instead of text tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output format: xlsx (one sheet per report) or csv (filtered rows)
    #[arg(short = 'f', long = "format", value_enum, default_value = "xlsx")]
    pub format: ExportFormat,
    /// Destination file (defaults to sales_analysis_report.xlsx or filtered_sales_data.csv)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
