//! Export of a report set to a multi-sheet workbook and of a dataset to
//! delimited text.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::{
    clean::{Dataset, SaleRecord},
    cli::{ExportArgs, ExportFormat},
    io_utils,
    report::{ReportSet, ReportTable, TableValue},
    session::Session,
};

pub const DEFAULT_WORKBOOK_NAME: &str = "sales_analysis_report.xlsx";
pub const DEFAULT_CSV_NAME: &str = "filtered_sales_data.csv";
const MAX_SHEET_NAME_CHARS: usize = 31;

pub fn execute(args: &ExportArgs) -> Result<()> {
    let session = Session::open(&args.input)?;
    let filtered = session.filtered(&args.filters.to_spec()?)?;
    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(match args.format {
            ExportFormat::Xlsx => DEFAULT_WORKBOOK_NAME,
            ExportFormat::Csv => DEFAULT_CSV_NAME,
        })
    });

    match args.format {
        ExportFormat::Xlsx => {
            let reports = Session::reports(&filtered)?;
            write_workbook(&reports, &output)?;
            info!(
                "Wrote {} report sheet(s) to {:?}",
                reports.tables().len(),
                output
            );
        }
        ExportFormat::Csv => {
            let sink = io_utils::open_output(Some(output.as_path()))?;
            write_dataset_csv(&filtered, sink, io_utils::DEFAULT_CSV_DELIMITER)
                .with_context(|| format!("Writing filtered data to {output:?}"))?;
            info!("Wrote {} row(s) to {:?}", filtered.len(), output);
        }
    }
    Ok(())
}

/// Report key truncated to 31 characters with spaces and slashes replaced.
pub fn sheet_name(key: &str) -> String {
    key.chars()
        .take(MAX_SHEET_NAME_CHARS)
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect()
}

pub fn build_workbook(reports: &ReportSet) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    for table in reports.tables() {
        let worksheet = workbook.add_worksheet();
        let name = sheet_name(table.name.key());
        worksheet
            .set_name(&name)
            .with_context(|| format!("Naming sheet '{name}'"))?;
        write_sheet(worksheet, &table, &header_format)
            .with_context(|| format!("Writing sheet '{name}'"))?;
    }
    Ok(workbook)
}

pub fn write_workbook(reports: &ReportSet, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(reports)?;
    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))
}

fn write_sheet(worksheet: &mut Worksheet, table: &ReportTable, header_format: &Format) -> Result<()> {
    let offset: u16 = if table.has_row_index() { 1 } else { 0 };
    if let Some(index) = &table.index {
        worksheet.write_string_with_format(0, 0, index.label.as_str(), header_format)?;
        for (row, value) in index.values.iter().enumerate() {
            worksheet.write_string_with_format(sheet_row(row)?, 0, value.as_str(), header_format)?;
        }
    }
    for (col, header) in table.headers.iter().enumerate() {
        let col = sheet_col(col)? + offset;
        worksheet.write_string_with_format(0, col, header.as_str(), header_format)?;
    }
    for (row, values) in table.rows.iter().enumerate() {
        let row = sheet_row(row)?;
        for (col, value) in values.iter().enumerate() {
            let col = sheet_col(col)? + offset;
            match value {
                TableValue::Text(text) => {
                    worksheet.write_string(row, col, text.as_str())?;
                }
                TableValue::Number(number) => {
                    worksheet.write_number(row, col, *number)?;
                }
                TableValue::Count(count) => {
                    worksheet.write_number(row, col, *count as f64)?;
                }
            }
        }
    }
    Ok(())
}

/// Worksheet row for a 0-based data row; row 0 holds the header.
fn sheet_row(idx: usize) -> Result<u32> {
    u32::try_from(idx + 1).context("Report has too many rows for a worksheet")
}

fn sheet_col(idx: usize) -> Result<u16> {
    u16::try_from(idx).context("Report has too many columns for a worksheet")
}

/// Writes the dataset with a header row using the canonical field order.
pub fn write_dataset_csv<W: Write>(dataset: &Dataset, sink: W, delimiter: u8) -> Result<()> {
    let mut writer = io_utils::csv_writer(sink, delimiter);
    writer
        .write_record(SaleRecord::FIELD_NAMES)
        .context("Writing header row")?;
    for (idx, record) in dataset.iter().enumerate() {
        writer
            .write_record(record_fields(record))
            .with_context(|| format!("Writing row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(())
}

fn record_fields(record: &SaleRecord) -> [String; 8] {
    [
        record.order_date.format("%Y-%m-%d").to_string(),
        record.region.clone(),
        record.product.clone(),
        record.quantity.to_string(),
        record.unit_price.to_string(),
        record.revenue.to_string(),
        record.year.to_string(),
        record.month.clone(),
    ]
}
