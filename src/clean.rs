//! Row validity rules, deduplication, and derived fields.
//!
//! Cleaning runs in a fixed order: rows missing any required field are
//! dropped, then rows with a non-positive quantity or unit price, then exact
//! duplicates (first occurrence kept). Revenue, year, and month are derived
//! last. Rows are never repaired.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    config::CandidateLists,
    data::RawTable,
    error::Result,
    schema::{NormalizedRow, normalize_with},
};

/// A validated sale with its derived fields. `quantity` and `unit_price` are
/// always strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub order_date: NaiveDate,
    pub region: String,
    pub product: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub revenue: f64,
    pub year: i32,
    pub month: String,
}

impl SaleRecord {
    pub const FIELD_NAMES: [&'static str; 8] = [
        "order_date",
        "region",
        "product",
        "quantity",
        "unit_price",
        "revenue",
        "year",
        "month",
    ];

    pub fn new(
        order_date: NaiveDate,
        region: impl Into<String>,
        product: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Self {
        Self {
            order_date,
            region: region.into(),
            product: product.into(),
            quantity,
            unit_price,
            revenue: quantity * unit_price,
            year: order_date.year(),
            month: month_key(order_date),
        }
    }
}

impl From<&SaleRecord> for NormalizedRow {
    fn from(record: &SaleRecord) -> Self {
        NormalizedRow {
            order_date: Some(record.order_date),
            region: Some(record.region.clone()),
            product: Some(record.product.clone()),
            quantity: Some(record.quantity),
            unit_price: Some(record.unit_price),
        }
    }
}

/// `YYYY-MM` bucket for a date. Lexicographic order on these keys is chronological.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// An immutable, duplicate-free sequence of cleaned sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<SaleRecord>,
}

impl Dataset {
    /// Builds a dataset from arbitrary records, dropping those with a
    /// non-positive quantity or unit price and all but the first of any
    /// duplicates.
    pub fn new(records: Vec<SaleRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|r| r.quantity > 0.0 && r.unit_price > 0.0)
            .filter(|r| {
                seen.insert(dedup_key(
                    r.order_date,
                    &r.region,
                    &r.product,
                    r.quantity,
                    r.unit_price,
                ))
            })
            .collect();
        Self { records }
    }

    /// Wraps records that already satisfy the cleaning invariants.
    pub(crate) fn from_records(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SaleRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest order date, `None` when empty.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.order_date).min()?;
        let last = self.records.iter().map(|r| r.order_date).max()?;
        Some((first, last))
    }

    /// Sorted distinct regions.
    pub fn regions(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.region.clone())
            .unique()
            .sorted()
            .collect()
    }

    /// Sorted distinct products.
    pub fn products(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.product.clone())
            .unique()
            .sorted()
            .collect()
    }

    pub fn filter_options(&self) -> FilterOptions {
        let bounds = self.date_bounds();
        FilterOptions {
            regions: self.regions(),
            products: self.products(),
            first_date: bounds.map(|(first, _)| first),
            last_date: bounds.map(|(_, last)| last),
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        let bounds = self.date_bounds();
        DatasetSummary {
            rows: self.len(),
            distinct_regions: self.records.iter().map(|r| &r.region).unique().count(),
            distinct_products: self.records.iter().map(|r| &r.product).unique().count(),
            first_date: bounds.map(|(first, _)| first),
            last_date: bounds.map(|(_, last)| last),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a SaleRecord;
    type IntoIter = std::slice::Iter<'a, SaleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Values a caller can narrow the dataset by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub products: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub distinct_regions: usize,
    pub distinct_products: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Cleaned dataset together with how many rows each rule removed.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    pub dataset: Dataset,
    pub rows_in: usize,
    pub dropped_missing: usize,
    pub dropped_non_positive: usize,
    pub dropped_duplicates: usize,
}

impl CleanOutcome {
    pub fn rows_out(&self) -> usize {
        self.dataset.len()
    }

    /// Rows excluded as invalid or duplicate.
    pub fn excluded(&self) -> usize {
        self.rows_in - self.rows_out()
    }
}

pub fn clean(rows: &[NormalizedRow]) -> Dataset {
    clean_with_stats(rows).dataset
}

pub fn clean_with_stats(rows: &[NormalizedRow]) -> CleanOutcome {
    let mut dropped_missing = 0usize;
    let mut dropped_non_positive = 0usize;
    let mut dropped_duplicates = 0usize;
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let (Some(order_date), Some(region), Some(product), Some(quantity), Some(unit_price)) = (
            row.order_date,
            row.region.as_ref(),
            row.product.as_ref(),
            row.quantity,
            row.unit_price,
        ) else {
            dropped_missing += 1;
            continue;
        };
        if quantity <= 0.0 || unit_price <= 0.0 {
            dropped_non_positive += 1;
            continue;
        }
        if !seen.insert(dedup_key(order_date, region, product, quantity, unit_price)) {
            dropped_duplicates += 1;
            continue;
        }
        records.push(SaleRecord::new(
            order_date,
            region.as_str(),
            product.as_str(),
            quantity,
            unit_price,
        ));
    }

    CleanOutcome {
        dataset: Dataset::from_records(records),
        rows_in: rows.len(),
        dropped_missing,
        dropped_non_positive,
        dropped_duplicates,
    }
}

type DedupKey = (NaiveDate, String, String, u64, u64);

fn dedup_key(
    order_date: NaiveDate,
    region: &str,
    product: &str,
    quantity: f64,
    unit_price: f64,
) -> DedupKey {
    (
        order_date,
        region.to_string(),
        product.to_string(),
        quantity.to_bits(),
        unit_price.to_bits(),
    )
}

/// Normalizes and cleans a raw table in one step.
pub fn prepare(raw: &RawTable, candidates: &CandidateLists) -> Result<CleanOutcome> {
    let normalized = normalize_with(raw, candidates)?;
    Ok(clean_with_stats(&normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(
        order_date: Option<NaiveDate>,
        region: Option<&str>,
        product: Option<&str>,
        quantity: Option<f64>,
        unit_price: Option<f64>,
    ) -> NormalizedRow {
        NormalizedRow {
            order_date,
            region: region.map(str::to_string),
            product: product.map(str::to_string),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn clean_drops_invalid_and_duplicate_rows() {
        let day = Some(date(2024, 1, 5));
        let rows = vec![
            row(day, Some("East"), Some("Widget"), Some(3.0), Some(10.0)),
            row(day, Some("East"), Some("Widget"), Some(3.0), Some(10.0)),
            row(None, Some("East"), Some("Widget"), Some(3.0), Some(10.0)),
            row(day, Some("East"), None, Some(3.0), Some(10.0)),
            row(day, Some("East"), Some("Widget"), Some(-1.0), Some(10.0)),
            row(day, Some("East"), Some("Widget"), Some(1.0), Some(0.0)),
        ];
        let outcome = clean_with_stats(&rows);
        assert_eq!(outcome.rows_in, 6);
        assert_eq!(outcome.rows_out(), 1);
        assert_eq!(outcome.dropped_missing, 2);
        assert_eq!(outcome.dropped_non_positive, 2);
        assert_eq!(outcome.dropped_duplicates, 1);
        assert_eq!(outcome.excluded(), 5);
    }

    #[test]
    fn clean_derives_revenue_year_and_month() {
        let rows = vec![row(
            Some(date(2023, 11, 30)),
            Some("West"),
            Some("Gadget"),
            Some(2.0),
            Some(5.5),
        )];
        let dataset = clean(&rows);
        let record = &dataset.records()[0];
        assert_eq!(record.revenue, 11.0);
        assert_eq!(record.year, 2023);
        assert_eq!(record.month, "2023-11");
    }

    #[test]
    fn near_duplicates_are_kept() {
        let day = Some(date(2024, 1, 5));
        let rows = vec![
            row(day, Some("East"), Some("Widget"), Some(3.0), Some(10.0)),
            row(day, Some("East"), Some("Widget"), Some(3.0), Some(10.5)),
        ];
        assert_eq!(clean(&rows).len(), 2);
    }

    #[test]
    fn dataset_exposes_filter_options_and_summary() {
        let dataset = Dataset::from_records(vec![
            SaleRecord::new(date(2024, 2, 1), "West", "Gadget", 2.0, 5.0),
            SaleRecord::new(date(2024, 1, 5), "East", "Widget", 3.0, 10.0),
            SaleRecord::new(date(2024, 3, 9), "East", "Gadget", 1.0, 4.0),
        ]);
        assert_eq!(dataset.regions(), vec!["East", "West"]);
        assert_eq!(dataset.products(), vec!["Gadget", "Widget"]);
        assert_eq!(
            dataset.date_bounds(),
            Some((date(2024, 1, 5), date(2024, 3, 9)))
        );
        let options = dataset.filter_options();
        assert_eq!(options.regions, vec!["East", "West"]);
        assert_eq!(options.last_date, Some(date(2024, 3, 9)));
        let summary = dataset.summary();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.distinct_regions, 2);
        assert_eq!(summary.distinct_products, 2);
    }

    #[test]
    fn new_dataset_enforces_cleaning_invariants() {
        let day = date(2024, 1, 5);
        let dataset = Dataset::new(vec![
            SaleRecord::new(day, "East", "Widget", 3.0, 10.0),
            SaleRecord::new(day, "East", "Widget", 3.0, 10.0),
            SaleRecord::new(day, "East", "Widget", -1.0, 10.0),
            SaleRecord::new(day, "East", "Widget", 1.0, 0.0),
            SaleRecord::new(day, "West", "Widget", 3.0, 10.0),
        ]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.regions(), vec!["East", "West"]);
    }

    #[test]
    fn empty_dataset_has_no_bounds() {
        let dataset = Dataset::default();
        assert_eq!(dataset.date_bounds(), None);
        assert_eq!(dataset.summary().first_date, None);
    }
}
