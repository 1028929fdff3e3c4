//! The `report` command: summary, filtered row preview, and every report.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    clean::{Dataset, DatasetSummary, FilterOptions},
    cli::ReportArgs,
    report::{ReportName, ReportSet, ReportTable},
    session::Session,
    table,
};

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    summary: DatasetSummary,
    options: FilterOptions,
    excluded_rows: usize,
    reports: &'a ReportSet,
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let session = Session::open(&args.input)?;
    let spec = args.filters.to_spec()?;
    let filtered = session.filtered(&spec)?;
    let reports = Session::reports(&filtered)?;
    info!(
        "Reporting on {} of {} cleaned row(s)",
        filtered.len(),
        session.dataset().len()
    );

    if args.json {
        let payload = JsonReport {
            summary: filtered.summary(),
            options: session.dataset().filter_options(),
            excluded_rows: session.cleaned.excluded(),
            reports: &reports,
        };
        let text = serde_json::to_string_pretty(&payload).context("Serializing report set")?;
        println!("{text}");
        return Ok(());
    }

    print!("{}", render_options(&session.dataset().filter_options()));
    println!();
    print!("{}", render_text(&filtered, &reports, args.rows, args.top));
    Ok(())
}

/// Full text rendering used by the `report` command.
pub fn render_text(dataset: &Dataset, reports: &ReportSet, rows: usize, top: usize) -> String {
    let mut output = String::new();
    output.push_str(&render_summary(&dataset.summary()));
    output.push('\n');

    let shown = rows.min(dataset.len());
    output.push_str(&format!("Data preview ({shown} of {} rows)\n", dataset.len()));
    output.push_str(&table::render_records(&dataset.records()[..shown]));

    for name in ReportName::ALL {
        let report = match name {
            ReportName::RevenueByProduct => reports.top_products_table(top),
            other => reports.table(other),
        };
        output.push('\n');
        output.push_str(&section_title(&report));
        output.push('\n');
        output.push_str(&table::render_report(&report));
    }
    output
}

pub fn render_summary(summary: &DatasetSummary) -> String {
    let range = match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "n/a".to_string(),
    };
    let headers = vec!["Summary".to_string(), "Value".to_string()];
    let rows = vec![
        vec!["Rows".to_string(), summary.rows.to_string()],
        vec!["Regions".to_string(), summary.distinct_regions.to_string()],
        vec!["Products".to_string(), summary.distinct_products.to_string()],
        vec!["Date range".to_string(), range],
    ];
    table::render_table(&headers, &rows)
}

/// Regions, products, and the date span available for filtering.
pub fn render_options(options: &FilterOptions) -> String {
    let span = match (options.first_date, options.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "n/a".to_string(),
    };
    let headers = vec!["Filter".to_string(), "Available values".to_string()];
    let rows = vec![
        vec!["--start/--end".to_string(), span],
        vec!["--region".to_string(), options.regions.join(" | ")],
        vec!["--product".to_string(), options.products.join(" | ")],
    ];
    table::render_table(&headers, &rows)
}

fn section_title(report: &ReportTable) -> String {
    match report.name {
        ReportName::OverallKpis => "Overall KPIs".to_string(),
        ReportName::MonthlyPerformance => "Monthly performance".to_string(),
        ReportName::RevenueByRegion => "Revenue by region".to_string(),
        ReportName::RevenueByProduct => format!("Top products ({} shown)", report.rows.len()),
        ReportName::RegionMonthPivot => "Region x month revenue".to_string(),
    }
}
