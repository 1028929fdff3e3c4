use thiserror::Error;

use crate::schema::CanonicalField;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SalesError {
    #[error(
        "Missing required columns (or unable to auto-detect): [{}]. Make sure the file has date, region, product, quantity, and unit price.",
        join_fields(.missing)
    )]
    Schema { missing: Vec<CanonicalField> },

    #[error("No data matches the selected filters. Adjust filters to see results.")]
    NoDataAfterFilter,
}

impl SalesError {
    /// Canonical fields that could not be resolved, empty for non-schema errors.
    pub fn missing_fields(&self) -> &[CanonicalField] {
        match self {
            SalesError::Schema { missing } => missing,
            SalesError::NoDataAfterFilter => &[],
        }
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SalesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_missing_fields_in_order() {
        let err = SalesError::Schema {
            missing: vec![CanonicalField::Region, CanonicalField::UnitPrice],
        };
        let message = err.to_string();
        assert!(message.starts_with(
            "Missing required columns (or unable to auto-detect): [region, unit_price]."
        ));
        assert_eq!(
            err.missing_fields(),
            &[CanonicalField::Region, CanonicalField::UnitPrice]
        );
    }

    #[test]
    fn no_data_error_has_no_missing_fields() {
        assert!(SalesError::NoDataAfterFilter.missing_fields().is_empty());
    }
}
