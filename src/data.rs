//! Loosely typed raw tables and best-effort cell coercion.
//!
//! A [`RawTable`] is what an uploaded CSV or spreadsheet looks like before any
//! schema is applied: arbitrary header names and cells of mixed type. The
//! `coerce_*` helpers turn a single cell into a typed value, returning `None`
//! whenever the cell cannot be interpreted. Coercion never fails loudly; rows
//! holding a `None` in a required field are dropped later by the cleaner.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%b %d, %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.clone(),
            RawCell::Integer(i) => i.to_string(),
            RawCell::Float(f) => format_float(*f),
            RawCell::Bool(b) => b.to_string(),
            RawCell::Date(d) => d.format("%Y-%m-%d").to_string(),
            RawCell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Field values read as missing, matching the default NA markers of common
/// dataframe readers.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing_token(value: &str) -> bool {
    MISSING_TOKENS.contains(&value)
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if is_missing_token(value) {
            RawCell::Empty
        } else {
            RawCell::Text(value.to_string())
        }
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        if is_missing_token(&value) {
            RawCell::Empty
        } else {
            RawCell::Text(value)
        }
    }
}

impl fmt::Display for RawCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Header names plus rows of loosely typed cells, as read from the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table of text cells. Empty strings and missing markers such as
/// `N/A` become [`RawCell::Empty`].
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| RawCell::from(c.as_ref())).collect())
            .collect();
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`/`column`; ragged rows read as empty past their end.
    pub fn cell(&self, row: usize, column: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&RawCell::Empty)
    }

    pub fn head(&self, limit: usize) -> &[Vec<RawCell>] {
        &self.rows[..self.rows.len().min(limit)]
    }
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    parse_naive_datetime(trimmed).map(|dt| dt.date())
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Interprets a cell as a calendar date. Datetimes are truncated to their date.
pub fn coerce_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::Empty | RawCell::Bool(_) => None,
        RawCell::Date(d) => Some(*d),
        RawCell::DateTime(dt) => Some(dt.date()),
        RawCell::Text(s) => parse_naive_date(s),
        RawCell::Integer(i) => parse_naive_date(&i.to_string()),
        RawCell::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            parse_naive_date(&format_float(*f))
        }
        RawCell::Float(_) => None,
    }
}

/// Interprets a cell as a finite number.
pub fn coerce_number(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Empty | RawCell::Date(_) | RawCell::DateTime(_) => return None,
        RawCell::Integer(i) => *i as f64,
        RawCell::Float(f) => *f,
        RawCell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Interprets a cell as a non-empty label.
pub fn coerce_text(cell: &RawCell) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.as_display())
    }
}

/// Integer-valued floats render without a fractional part.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
