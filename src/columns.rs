//! Heuristic column detection.
//!
//! Each canonical field has an ordered list of candidate substrings. For each
//! candidate, in priority order, the headers are scanned left to right and the
//! first header whose lowercased name contains the candidate wins. Candidate
//! order therefore beats header order: with headers `["price_list", "unit_price"]`
//! the `unit_price` candidate selects the second column even though `price`
//! would have matched the first.
//!
//! Matching is plain substring containment, so a header such as
//! `discount_price` is picked up by the `price` candidate when nothing better
//! exists.

use serde::Serialize;

use crate::{config::CandidateLists, schema::CanonicalField};

/// Position and original name of a header selected for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub name: String,
}

pub fn resolve<S, C>(columns: &[S], candidates: &[C]) -> Option<ResolvedColumn>
where
    S: AsRef<str>,
    C: AsRef<str>,
{
    let lowered = columns
        .iter()
        .map(|c| c.as_ref().to_lowercase())
        .collect::<Vec<_>>();
    for candidate in candidates {
        let needle = candidate.as_ref().to_lowercase();
        if let Some(index) = lowered.iter().position(|name| name.contains(&needle)) {
            return Some(ResolvedColumn {
                index,
                name: columns[index].as_ref().to_string(),
            });
        }
    }
    None
}

/// Resolution outcome for every canonical field, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub entries: Vec<(CanonicalField, Option<ResolvedColumn>)>,
}

impl ColumnMapping {
    pub fn detect<S: AsRef<str>>(headers: &[S], candidates: &CandidateLists) -> Self {
        let entries = CanonicalField::ALL
            .into_iter()
            .map(|field| (field, resolve(headers, candidates.for_field(field))))
            .collect();
        Self { entries }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, resolved)| resolved.as_ref())
    }

    pub fn missing(&self) -> Vec<CanonicalField> {
        self.entries
            .iter()
            .filter(|(_, resolved)| resolved.is_none())
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, resolved)| resolved.is_some())
    }
}
