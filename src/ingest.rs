//! Reading uploaded files into a [`RawTable`].
//!
//! Delimited text goes through the `csv` reader with optional transcoding;
//! spreadsheets (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) go through `calamine`.
//! The first row is always the header row.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, DataType, Range, Reader, open_workbook_auto};
use encoding_rs::Encoding;

use crate::{
    data::{RawCell, RawTable},
    io_utils,
};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone)]
pub struct ReadOptions<'a> {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet: Option<&'a str>,
    pub max_bytes: u64,
}

pub fn is_spreadsheet(path: &Path) -> bool {
    io_utils::extension(path).is_some_and(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.as_str()))
}

pub fn read_raw_table(path: &Path, options: &ReadOptions<'_>) -> Result<RawTable> {
    io_utils::ensure_within_limit(path, options.max_bytes)?;
    if is_spreadsheet(path) {
        read_spreadsheet(path, options.sheet)
    } else {
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        read_delimited(path, delimiter, options.encoding)
    }
}

pub fn read_delimited(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<RawTable> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} of {path:?}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", idx + 2))?;
        rows.push(decoded.into_iter().map(RawCell::from).collect());
    }
    Ok(RawTable::new(headers, rows))
}

/// Reads one worksheet, selected by name or 0-based index (first sheet by default).
pub fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        bail!("Workbook {path:?} has no worksheets");
    }
    let range = match sheet {
        Some(selector) => match selector.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| anyhow!("Workbook {path:?} has no sheet at index {idx}"))?
                .with_context(|| format!("Reading sheet {idx} of {path:?}"))?,
            Err(_) => workbook
                .worksheet_range(selector)
                .with_context(|| format!("Reading sheet '{selector}' of {path:?}"))?,
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook {path:?} has no first sheet"))?
            .with_context(|| format!("Reading first sheet of {path:?}"))?,
    };
    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return RawTable::default();
    };
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| match convert_cell(cell) {
            RawCell::Empty => format!("column_{}", idx + 1),
            other => other.as_display(),
        })
        .collect();
    let rows = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    RawTable::new(headers, rows)
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::from(s.as_str()),
        Data::Int(i) => RawCell::Integer(*i),
        Data::Float(f) => RawCell::Float(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == chrono::NaiveTime::MIN => RawCell::Date(dt.date()),
            Some(dt) => RawCell::DateTime(dt),
            None => RawCell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::from(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::UTF_8;

    use super::*;

    #[test]
    fn read_delimited_keeps_headers_and_empty_cells() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            "\u{feff}Order Date,Region,Qty\n2024-01-05,East,3\n2024-01-06,,\n",
        )
        .expect("write csv");
        let table = read_delimited(&path, b',', UTF_8).expect("read csv");
        assert_eq!(table.headers, vec!["Order Date", "Region", "Qty"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(1, 1), &RawCell::Empty);
        assert_eq!(table.cell(0, 2), &RawCell::Text("3".into()));
    }

    #[test]
    fn spreadsheet_detection_uses_extension() {
        assert!(is_spreadsheet(Path::new("report.XLSX")));
        assert!(is_spreadsheet(Path::new("legacy.xls")));
        assert!(!is_spreadsheet(Path::new("sales.csv")));
        assert!(!is_spreadsheet(Path::new("-")));
    }

    #[test]
    fn read_raw_table_honours_upload_limit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "a,b\n1,2\n").expect("write csv");
        let options = ReadOptions {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
            max_bytes: 4,
        };
        assert!(read_raw_table(&path, &options).is_err());
    }
}
