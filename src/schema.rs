//! Canonical sales schema and the normalizer that maps raw tables onto it.
//!
//! Normalization resolves the five required fields through
//! [`ColumnMapping::detect`], fails with [`SalesError::Schema`] naming every
//! field that could not be resolved, and otherwise coerces each row into a
//! [`NormalizedRow`]. Extra source columns are not carried over. Cells that do
//! not coerce become `None`; nothing in this module rejects a row.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    columns::ColumnMapping,
    config::CandidateLists,
    data::{RawTable, coerce_date, coerce_number, coerce_text},
    error::{Result, SalesError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    OrderDate,
    Region,
    Product,
    Quantity,
    UnitPrice,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::OrderDate,
        CanonicalField::Region,
        CanonicalField::Product,
        CanonicalField::Quantity,
        CanonicalField::UnitPrice,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::OrderDate => "order_date",
            CanonicalField::Region => "region",
            CanonicalField::Product => "product",
            CanonicalField::Quantity => "quantity",
            CanonicalField::UnitPrice => "unit_price",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row renamed to the canonical schema with per-field missing markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRow {
    pub order_date: Option<NaiveDate>,
    pub region: Option<String>,
    pub product: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

/// Normalizes using the built-in candidate lists.
pub fn normalize(raw: &RawTable) -> Result<Vec<NormalizedRow>> {
    normalize_with(raw, &CandidateLists::default())
}

pub fn normalize_with(raw: &RawTable, candidates: &CandidateLists) -> Result<Vec<NormalizedRow>> {
    let mapping = ColumnMapping::detect(&raw.headers, candidates);
    let indices = required_indices(&mapping)?;
    let [date_idx, region_idx, product_idx, quantity_idx, price_idx] = indices;

    let rows = (0..raw.row_count())
        .map(|row| NormalizedRow {
            order_date: coerce_date(raw.cell(row, date_idx)),
            region: coerce_text(raw.cell(row, region_idx)),
            product: coerce_text(raw.cell(row, product_idx)),
            quantity: coerce_number(raw.cell(row, quantity_idx)),
            unit_price: coerce_number(raw.cell(row, price_idx)),
        })
        .collect();
    Ok(rows)
}

fn required_indices(mapping: &ColumnMapping) -> Result<[usize; 5]> {
    let missing = mapping.missing();
    if !missing.is_empty() {
        return Err(SalesError::Schema { missing });
    }
    let mut indices = [0usize; 5];
    for (slot, field) in indices.iter_mut().zip(CanonicalField::ALL) {
        *slot = mapping
            .get(field)
            .map(|resolved| resolved.index)
            .ok_or_else(|| SalesError::Schema {
                missing: vec![field],
            })?;
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::from_strings(
            ["Order Date", "Region", "Item", "Qty", "Unit Price", "Notes"],
            vec![
                vec!["2024-01-05", "East", "Widget", "3", "10.0", "first"],
                vec!["bad", "West", "Gadget", "x", "", "second"],
            ],
        )
    }

    #[test]
    fn normalize_renames_and_coerces() {
        let rows = normalize(&sample()).expect("normalize");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(rows[0].region.as_deref(), Some("East"));
        assert_eq!(rows[0].product.as_deref(), Some("Widget"));
        assert_eq!(rows[0].quantity, Some(3.0));
        assert_eq!(rows[0].unit_price, Some(10.0));
    }

    #[test]
    fn coercion_failures_become_missing_markers() {
        let rows = normalize(&sample()).expect("normalize");
        assert_eq!(rows[1].order_date, None);
        assert_eq!(rows[1].quantity, None);
        assert_eq!(rows[1].unit_price, None);
        assert_eq!(rows[1].region.as_deref(), Some("West"));
    }

    #[test]
    fn normalize_fails_listing_every_missing_field() {
        let raw = RawTable::from_strings(["date", "amount"], vec![vec!["2024-01-01", "5"]]);
        let err = normalize(&raw).expect_err("schema error");
        assert_eq!(
            err,
            SalesError::Schema {
                missing: vec![
                    CanonicalField::Region,
                    CanonicalField::Product,
                    CanonicalField::Quantity,
                    CanonicalField::UnitPrice,
                ]
            }
        );
    }

    #[test]
    fn custom_candidates_are_honoured() {
        let raw = RawTable::from_strings(
            ["when", "zone", "article", "count", "cost"],
            vec![vec!["2024-02-01", "North", "Bolt", "2", "1.5"]],
        );
        let candidates = CandidateLists {
            order_date: vec!["when".into()],
            region: vec!["zone".into()],
            product: vec!["article".into()],
            quantity: vec!["count".into()],
            unit_price: vec!["cost".into()],
        };
        let rows = normalize_with(&raw, &candidates).expect("normalize");
        assert_eq!(rows[0].region.as_deref(), Some("North"));
        assert_eq!(rows[0].unit_price, Some(1.5));
    }
}
