//! Plain-text table rendering for previews and reports.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    clean::SaleRecord,
    data::{RawTable, format_float},
    report::{ReportTable, TableValue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let aligns = vec![Align::Left; headers.len()];
    render_aligned(headers, rows, &aligns)
}

pub fn render_aligned(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, aligns));

    let separator_cells = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let left = vec![Align::Left; widths.len()];
    let _ = writeln!(output, "{}", format_row(&separator_cells, &widths, &left));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Renders a report with its row index (if any) as the leading column and
/// numeric columns right-aligned.
pub fn render_report(table: &ReportTable) -> String {
    let mut headers = Vec::with_capacity(table.headers.len() + 1);
    let mut aligns = Vec::with_capacity(table.headers.len() + 1);
    if let Some(index) = &table.index {
        headers.push(index.label.clone());
        aligns.push(Align::Left);
    }
    headers.extend(table.headers.iter().cloned());
    for column in 0..table.headers.len() {
        let numeric = table
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .any(TableValue::is_numeric);
        aligns.push(if numeric { Align::Right } else { Align::Left });
    }

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let mut cells = Vec::with_capacity(headers.len());
            if let Some(index) = &table.index {
                cells.push(index.values.get(row_idx).cloned().unwrap_or_default());
            }
            cells.extend(row.iter().map(format_value));
            cells
        })
        .collect::<Vec<_>>();

    render_aligned(&headers, &rows, &aligns)
}

pub fn format_value(value: &TableValue) -> String {
    match value {
        TableValue::Text(s) => s.clone(),
        TableValue::Number(n) => format!("{n:.2}"),
        TableValue::Count(c) => c.to_string(),
    }
}

pub fn render_raw_preview(raw: &RawTable, limit: usize) -> String {
    let rows = raw
        .head(limit)
        .iter()
        .map(|row| {
            (0..raw.column_count())
                .map(|idx| row.get(idx).map(|c| c.as_display()).unwrap_or_default())
                .collect()
        })
        .collect::<Vec<Vec<String>>>();
    render_table(&raw.headers, &rows)
}

pub fn render_records(records: &[SaleRecord]) -> String {
    let headers = SaleRecord::FIELD_NAMES
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let aligns = [
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Left,
    ];
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.order_date.format("%Y-%m-%d").to_string(),
                r.region.clone(),
                r.product.clone(),
                format_float(r.quantity),
                format!("{:.2}", r.unit_price),
                format!("{:.2}", r.revenue),
                r.year.to_string(),
                r.month.clone(),
            ]
        })
        .collect::<Vec<_>>();
    render_aligned(&headers, &rows, &aligns)
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let padding = widths[idx].saturating_sub(display_width(sanitized.as_ref()));
        let cell = match aligns.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => format!("{sanitized}{}", " ".repeat(padding)),
            Align::Right => format!("{}{sanitized}", " ".repeat(padding)),
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI escape, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
