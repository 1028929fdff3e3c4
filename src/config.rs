//! Analyzer configuration: column-detection candidate lists and the upload limit.
//!
//! Defaults reproduce the built-in heuristics. A YAML file may override any
//! subset of keys:
//!
//! ```yaml
//! candidates:
//!   product: ["product", "article"]
//! max_upload_mb: 1024
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::schema::CanonicalField;

pub const DEFAULT_MAX_UPLOAD_MB: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CandidateLists {
    pub order_date: Vec<String>,
    pub region: Vec<String>,
    pub product: Vec<String>,
    pub quantity: Vec<String>,
    pub unit_price: Vec<String>,
}

impl Default for CandidateLists {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }
        Self {
            order_date: owned(&["order_date", "date"]),
            region: owned(&["region"]),
            product: owned(&["product", "item", "sku"]),
            quantity: owned(&["quantity", "qty", "units"]),
            unit_price: owned(&["unit_price", "unit price", "price"]),
        }
    }
}

impl CandidateLists {
    /// Candidates for `field`, highest priority first.
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::OrderDate => &self.order_date,
            CanonicalField::Region => &self.region,
            CanonicalField::Product => &self.product,
            CanonicalField::Quantity => &self.quantity,
            CanonicalField::UnitPrice => &self.unit_price,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for field in CanonicalField::ALL {
            let candidates = self.for_field(field);
            if candidates.is_empty() {
                bail!("Candidate list for '{}' must not be empty", field.as_str());
            }
            if candidates.iter().any(|c| c.trim().is_empty()) {
                bail!(
                    "Candidate list for '{}' contains a blank entry",
                    field.as_str()
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub candidates: CandidateLists,
    pub max_upload_mb: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            candidates: CandidateLists::default(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl AnalyzerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: AnalyzerConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Validating config {path:?}"))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_upload_mb == 0 {
            bail!("max_upload_mb must be greater than zero");
        }
        self.candidates.validate()
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
