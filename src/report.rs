//! Report generation over a cleaned (and usually filtered) dataset.
//!
//! Every report is recomputed from scratch on each call. Grouped reports are
//! built with one accumulation pass that remembers the order in which group
//! keys were first seen; the descending revenue sort is stable, so ties keep
//! that order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

use crate::{
    clean::{Dataset, SaleRecord},
    error::{Result, SalesError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportName {
    OverallKpis,
    MonthlyPerformance,
    RevenueByRegion,
    RevenueByProduct,
    RegionMonthPivot,
}

impl ReportName {
    pub const ALL: [ReportName; 5] = [
        ReportName::OverallKpis,
        ReportName::MonthlyPerformance,
        ReportName::RevenueByRegion,
        ReportName::RevenueByProduct,
        ReportName::RegionMonthPivot,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReportName::OverallKpis => "overall_kpis",
            ReportName::MonthlyPerformance => "monthly_performance",
            ReportName::RevenueByRegion => "revenue_by_region",
            ReportName::RevenueByProduct => "revenue_by_product",
            ReportName::RegionMonthPivot => "region_month_pivot",
        }
    }

}

impl fmt::Display for ReportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallKpis {
    pub total_revenue: f64,
    pub total_quantity: f64,
    pub order_count: usize,
    pub average_order_value: f64,
}

impl OverallKpis {
    pub const LABELS: [&'static str; 4] = [
        "Total Revenue",
        "Total Quantity Sold",
        "Number of Orders",
        "Average Order Value",
    ];

    pub fn compute(records: &[SaleRecord]) -> Self {
        let total_revenue = records.iter().map(|r| r.revenue).sum::<f64>();
        let total_quantity = records.iter().map(|r| r.quantity).sum::<f64>();
        let order_count = records.len();
        let average_order_value = if order_count > 0 {
            total_revenue / order_count as f64
        } else {
            0.0
        };
        Self {
            total_revenue,
            total_quantity,
            order_count,
            average_order_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub month: String,
    pub revenue: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals {
    pub key: String,
    pub revenue: f64,
    pub quantity: f64,
}

/// Running revenue/quantity sums keyed by group, in first-seen order.
#[derive(Debug, Default)]
struct GroupAccumulator {
    positions: HashMap<String, usize>,
    groups: Vec<GroupTotals>,
}

impl GroupAccumulator {
    fn add(&mut self, key: &str, revenue: f64, quantity: f64) {
        let idx = match self.positions.get(key) {
            Some(idx) => *idx,
            None => {
                self.positions.insert(key.to_string(), self.groups.len());
                self.groups.push(GroupTotals {
                    key: key.to_string(),
                    revenue: 0.0,
                    quantity: 0.0,
                });
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        group.revenue += revenue;
        group.quantity += quantity;
    }

    fn into_groups(self) -> Vec<GroupTotals> {
        self.groups
    }
}

fn group_by<F>(records: &[SaleRecord], key: F) -> Vec<GroupTotals>
where
    F: Fn(&SaleRecord) -> &str,
{
    let mut accumulator = GroupAccumulator::default();
    for record in records {
        accumulator.add(key(record), record.revenue, record.quantity);
    }
    accumulator.into_groups()
}

pub fn monthly_performance(records: &[SaleRecord]) -> Vec<PeriodTotals> {
    let mut groups = group_by(records, |r| r.month.as_str());
    // YYYY-MM keys sort chronologically as plain strings.
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
        .into_iter()
        .map(|g| PeriodTotals {
            month: g.key,
            revenue: g.revenue,
            quantity: g.quantity,
        })
        .collect()
}

fn ranked_by_revenue<F>(records: &[SaleRecord], key: F) -> Vec<GroupTotals>
where
    F: Fn(&SaleRecord) -> &str,
{
    let mut groups = group_by(records, key);
    groups.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    groups
}

pub fn revenue_by_region(records: &[SaleRecord]) -> Vec<GroupTotals> {
    ranked_by_revenue(records, |r| r.region.as_str())
}

pub fn revenue_by_product(records: &[SaleRecord]) -> Vec<GroupTotals> {
    ranked_by_revenue(records, |r| r.product.as_str())
}

/// Dense region × month revenue table over the regions and months present in
/// the data. Both axes are sorted ascending; absent combinations hold 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMonthPivot {
    pub regions: Vec<String>,
    pub months: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl RegionMonthPivot {
    pub fn compute(records: &[SaleRecord]) -> Self {
        let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
        let mut regions = BTreeSet::new();
        let mut months = BTreeSet::new();
        for record in records {
            regions.insert(record.region.as_str());
            months.insert(record.month.as_str());
            *cells
                .entry((record.region.as_str(), record.month.as_str()))
                .or_insert(0.0) += record.revenue;
        }
        let values: Vec<Vec<f64>> = regions
            .iter()
            .map(|region| {
                months
                    .iter()
                    .map(|month| cells.get(&(*region, *month)).copied().unwrap_or(0.0))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            regions: regions.into_iter().map(str::to_string).collect(),
            months: months.into_iter().map(str::to_string).collect(),
            values,
        }
    }

    pub fn row_total(&self, region: &str) -> Option<f64> {
        let row = self.regions.iter().position(|r| r == region)?;
        Some(self.values[row].iter().sum())
    }

    pub fn column_total(&self, month: &str) -> Option<f64> {
        let column = self.months.iter().position(|m| m == month)?;
        Some(self.values.iter().map(|row| row[column]).sum())
    }
}

/// The five reports derived from one dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSet {
    pub overall_kpis: OverallKpis,
    pub monthly_performance: Vec<PeriodTotals>,
    pub revenue_by_region: Vec<GroupTotals>,
    pub revenue_by_product: Vec<GroupTotals>,
    pub region_month_pivot: RegionMonthPivot,
}

/// Computes every report. An empty dataset yields
/// [`SalesError::NoDataAfterFilter`]; callers are expected to check first.
pub fn generate(dataset: &Dataset) -> Result<ReportSet> {
    if dataset.is_empty() {
        return Err(SalesError::NoDataAfterFilter);
    }
    let records = dataset.records();
    Ok(ReportSet {
        overall_kpis: OverallKpis::compute(records),
        monthly_performance: monthly_performance(records),
        revenue_by_region: revenue_by_region(records),
        revenue_by_product: revenue_by_product(records),
        region_month_pivot: RegionMonthPivot::compute(records),
    })
}

impl ReportSet {
    pub fn top_products(&self, limit: usize) -> &[GroupTotals] {
        &self.revenue_by_product[..self.revenue_by_product.len().min(limit)]
    }

    pub fn table(&self, name: ReportName) -> ReportTable {
        match name {
            ReportName::OverallKpis => kpi_table(&self.overall_kpis),
            ReportName::MonthlyPerformance => ReportTable {
                name,
                index: None,
                headers: vec!["month".into(), "revenue".into(), "quantity".into()],
                rows: self
                    .monthly_performance
                    .iter()
                    .map(|p| {
                        vec![
                            TableValue::Text(p.month.clone()),
                            TableValue::Number(p.revenue),
                            TableValue::Number(p.quantity),
                        ]
                    })
                    .collect(),
            },
            ReportName::RevenueByRegion => group_table(name, "region", &self.revenue_by_region),
            ReportName::RevenueByProduct => {
                group_table(name, "product", &self.revenue_by_product)
            }
            ReportName::RegionMonthPivot => pivot_table(&self.region_month_pivot),
        }
    }

    /// The product ranking cut to its first `limit` entries.
    pub fn top_products_table(&self, limit: usize) -> ReportTable {
        group_table(ReportName::RevenueByProduct, "product", self.top_products(limit))
    }

    /// All reports in their fixed order.
    pub fn tables(&self) -> Vec<ReportTable> {
        ReportName::ALL.into_iter().map(|name| self.table(name)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableValue {
    Text(String),
    Number(f64),
    Count(usize),
}

impl TableValue {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, TableValue::Text(_))
    }
}

/// Labelled row identifiers for reports whose rows are not positional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIndex {
    pub label: String,
    pub values: Vec<String>,
}

/// Presentation-neutral view of a report: column headers plus rows of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub name: ReportName,
    pub index: Option<RowIndex>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableValue>>,
}

impl ReportTable {
    pub fn has_row_index(&self) -> bool {
        self.index.is_some()
    }
}

fn kpi_table(kpis: &OverallKpis) -> ReportTable {
    let values = [
        TableValue::Number(kpis.total_revenue),
        TableValue::Number(kpis.total_quantity),
        TableValue::Count(kpis.order_count),
        TableValue::Number(kpis.average_order_value),
    ];
    ReportTable {
        name: ReportName::OverallKpis,
        index: None,
        headers: vec!["Metric".into(), "Value".into()],
        rows: OverallKpis::LABELS
            .into_iter()
            .zip(values)
            .map(|(label, value)| vec![TableValue::Text(label.to_string()), value])
            .collect(),
    }
}

fn group_table(name: ReportName, key_header: &str, groups: &[GroupTotals]) -> ReportTable {
    ReportTable {
        name,
        index: None,
        headers: vec![key_header.into(), "revenue".into(), "quantity".into()],
        rows: groups
            .iter()
            .map(|g| {
                vec![
                    TableValue::Text(g.key.clone()),
                    TableValue::Number(g.revenue),
                    TableValue::Number(g.quantity),
                ]
            })
            .collect(),
    }
}

fn pivot_table(pivot: &RegionMonthPivot) -> ReportTable {
    ReportTable {
        name: ReportName::RegionMonthPivot,
        index: Some(RowIndex {
            label: "region".into(),
            values: pivot.regions.clone(),
        }),
        headers: pivot.months.clone(),
        rows: pivot
            .values
            .iter()
            .map(|row| row.iter().map(|v| TableValue::Number(*v)).collect())
            .collect(),
    }
}
