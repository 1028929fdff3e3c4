//! Date-range, region, and product narrowing of a cleaned dataset.
//!
//! An empty region or product selection means "no restriction", never
//! "match nothing". Date bounds are inclusive and either side may be open.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clean::{Dataset, SaleRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub date_range: Option<DateRange>,
    pub regions: Option<BTreeSet<String>>,
    pub products: Option<BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = Some(products.into_iter().map(Into::into).collect());
        self
    }

    /// True when no predicate narrows the data.
    pub fn is_unrestricted(&self) -> bool {
        self.date_range
            .is_none_or(|range| range.start.is_none() && range.end.is_none())
            && is_open(self.regions.as_ref())
            && is_open(self.products.as_ref())
    }

    pub fn matches(&self, record: &SaleRecord) -> bool {
        self.date_range
            .is_none_or(|range| range.contains(record.order_date))
            && member_or_open(self.regions.as_ref(), &record.region)
            && member_or_open(self.products.as_ref(), &record.product)
    }
}

fn is_open(selection: Option<&BTreeSet<String>>) -> bool {
    selection.is_none_or(BTreeSet::is_empty)
}

fn member_or_open(selection: Option<&BTreeSet<String>>, value: &str) -> bool {
    match selection {
        Some(set) if !set.is_empty() => set.contains(value),
        _ => true,
    }
}

/// Returns a new dataset holding the records that pass `spec`, in original order.
pub fn apply(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    if spec.is_unrestricted() {
        return dataset.clone();
    }
    Dataset::from_records(
        dataset
            .iter()
            .filter(|record| spec.matches(record))
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            SaleRecord::new(date(2024, 1, 5), "East", "Widget", 3.0, 10.0),
            SaleRecord::new(date(2024, 2, 1), "West", "Gadget", 2.0, 5.0),
            SaleRecord::new(date(2024, 3, 15), "North", "Widget", 1.0, 7.0),
        ])
    }

    #[test]
    fn empty_region_set_means_all_regions() {
        let spec = FilterSpec::new().with_regions(Vec::<String>::new());
        assert!(spec.is_unrestricted());
        assert_eq!(apply(&dataset(), &spec).len(), 3);
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let spec = FilterSpec::new().with_date_range(Some(date(2024, 1, 5)), Some(date(2024, 2, 1)));
        let filtered = apply(&dataset(), &spec);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn open_bound_is_unbounded() {
        let spec = FilterSpec::new().with_date_range(Some(date(2024, 2, 1)), None);
        assert_eq!(apply(&dataset(), &spec).len(), 2);
        let spec = FilterSpec::new().with_date_range(None, Some(date(2024, 1, 31)));
        assert_eq!(apply(&dataset(), &spec).len(), 1);
    }

    #[test]
    fn predicates_combine_with_and() {
        let spec = FilterSpec::new()
            .with_regions(["East", "North"])
            .with_products(["Widget"])
            .with_date_range(Some(date(2024, 3, 1)), None);
        let filtered = apply(&dataset(), &spec);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records()[0].region, "North");
    }

    #[test]
    fn non_matching_selection_yields_empty_dataset() {
        let spec = FilterSpec::new().with_products(["Sprocket"]);
        assert!(apply(&dataset(), &spec).is_empty());
    }
}
