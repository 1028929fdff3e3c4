mod common;

use chrono::NaiveDate;
use encoding_rs::UTF_8;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use sales_analyzer::{
    config::CandidateLists,
    data::{RawCell, coerce_number},
    ingest::{self, ReadOptions},
    prepare,
};

use common::TestWorkspace;

const NO_LIMIT: u64 = u64::MAX;

fn options(sheet: Option<&str>) -> ReadOptions<'_> {
    ReadOptions {
        delimiter: None,
        encoding: UTF_8,
        sheet,
        max_bytes: NO_LIMIT,
    }
}

fn write_workbook(path: &std::path::Path) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let cover = workbook.add_worksheet();
    cover.set_name("Cover").unwrap();
    cover.write_string(0, 0, "Quarterly extract").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Orders").unwrap();
    for (col, header) in ["Order Date", "Region", "Item", "Units", "Price"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    let date = ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
    sheet
        .write_datetime_with_format(1, 0, &date, &date_format)
        .unwrap();
    sheet.write_string(1, 1, "South").unwrap();
    sheet.write_string(1, 2, "Lamp").unwrap();
    sheet.write_number(1, 3, 2.0).unwrap();
    sheet.write_number(1, 4, 7.5).unwrap();

    sheet.write_string(2, 0, "2024-03-16").unwrap();
    sheet.write_string(2, 1, "South").unwrap();
    sheet.write_string(2, 2, "Lamp").unwrap();
    sheet.write_number(2, 3, 1.0).unwrap();
    sheet.write_number(2, 4, 7.5).unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn spreadsheet_sheet_can_be_selected_by_name_or_index() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("orders.xlsx");
    write_workbook(&path);

    let by_name = ingest::read_raw_table(&path, &options(Some("Orders"))).expect("read by name");
    let by_index = ingest::read_raw_table(&path, &options(Some("1"))).expect("read by index");
    assert_eq!(by_name, by_index);
    assert_eq!(
        by_name.headers,
        vec!["Order Date", "Region", "Item", "Units", "Price"]
    );
    assert_eq!(by_name.row_count(), 2);

    let first = ingest::read_raw_table(&path, &options(None)).expect("read first sheet");
    assert_eq!(first.headers, vec!["Quarterly extract"]);
}

#[test]
fn spreadsheet_dates_and_text_dates_both_clean() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("orders.xlsx");
    write_workbook(&path);

    let raw = ingest::read_raw_table(&path, &options(Some("Orders"))).unwrap();
    assert_eq!(coerce_number(raw.cell(0, 3)), Some(2.0));

    let outcome = prepare(&raw, &CandidateLists::default()).expect("prepare");
    assert_eq!(outcome.rows_out(), 2);
    let dates: Vec<_> = outcome.dataset.iter().map(|r| r.order_date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        ]
    );
    assert_eq!(outcome.dataset.records()[0].revenue, 15.0);
}

#[test]
fn missing_sheet_is_reported() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("orders.xlsx");
    write_workbook(&path);

    let err = ingest::read_raw_table(&path, &options(Some("Returns"))).expect_err("no sheet");
    assert!(format!("{err:#}").contains("Returns"));
}

#[test]
fn latin1_csv_is_transcoded() {
    let workspace = TestWorkspace::new();
    let path = workspace.file("latin1.csv");
    let mut bytes = b"date,region,product,qty,price\n2024-01-05,".to_vec();
    bytes.extend_from_slice(&[0x4d, 0xfc, 0x6e, 0x63, 0x68, 0x65, 0x6e]);
    bytes.extend_from_slice(b",Widget,1,2.5\n");
    std::fs::write(&path, bytes).unwrap();

    let encoding = encoding_rs::Encoding::for_label(b"latin1").unwrap();
    let options = ReadOptions {
        delimiter: None,
        encoding,
        sheet: None,
        max_bytes: NO_LIMIT,
    };
    let raw = ingest::read_raw_table(&path, &options).expect("read latin1");
    assert_eq!(raw.cell(0, 1), &RawCell::Text("München".to_string()));
}

#[test]
fn delimited_missing_markers_become_empty_cells() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "markers.csv",
        "date,region,product,qty,price\n2024-01-05,N/A,Widget,1,2.5\n2024-01-06,East,<NA>,1,2.5\n",
    );
    let raw = ingest::read_raw_table(&path, &options(None)).expect("read csv");
    assert_eq!(raw.cell(0, 1), &RawCell::Empty);
    assert_eq!(raw.cell(1, 2), &RawCell::Empty);

    let outcome = prepare(&raw, &CandidateLists::default()).unwrap();
    assert_eq!(outcome.rows_out(), 0);
    assert_eq!(outcome.dropped_missing, 2);
}
