//! One analysis session: a loaded upload and its cleaned dataset.
//!
//! The session owns immutable snapshots. Filtering produces a new dataset and
//! reporting produces a new report set; nothing is cached between calls.

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::{
    clean::{CleanOutcome, Dataset, prepare},
    cli::InputArgs,
    columns::ColumnMapping,
    config::AnalyzerConfig,
    data::RawTable,
    error::SalesError,
    filter::{self, FilterSpec},
    ingest::{self, ReadOptions},
    io_utils,
    report::{self, ReportSet},
};

#[derive(Debug, Clone)]
pub struct Session {
    pub config: AnalyzerConfig,
    pub raw: RawTable,
    pub cleaned: CleanOutcome,
}

impl Session {
    /// Loads the input described by `args` and cleans it.
    pub fn open(args: &InputArgs) -> Result<Self> {
        let config = AnalyzerConfig::load_or_default(args.config.as_deref())?;
        let raw = load_raw(args, &config)?;
        Self::from_raw(config, raw)
    }

    pub fn from_raw(config: AnalyzerConfig, raw: RawTable) -> Result<Self> {
        let mapping = ColumnMapping::detect(&raw.headers, &config.candidates);
        for (field, resolved) in &mapping.entries {
            if let Some(column) = resolved {
                debug!("Resolved '{}' from column '{}'", field, column.name);
            }
        }
        let cleaned = prepare(&raw, &config.candidates)?;
        if cleaned.excluded() > 0 {
            warn!(
                "{} of {} row(s) excluded as invalid ({} missing values, {} non-positive, {} duplicates)",
                cleaned.excluded(),
                cleaned.rows_in,
                cleaned.dropped_missing,
                cleaned.dropped_non_positive,
                cleaned.dropped_duplicates
            );
        }
        if cleaned.dataset.is_empty() {
            return Err(SalesError::NoDataAfterFilter.into());
        }
        Ok(Self {
            config,
            raw,
            cleaned,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.cleaned.dataset
    }

    /// Applies `spec`, failing with [`SalesError::NoDataAfterFilter`] when
    /// nothing survives.
    pub fn filtered(&self, spec: &FilterSpec) -> Result<Dataset> {
        debug!("Applying filter {spec:?}");
        let filtered = filter::apply(self.dataset(), spec);
        if filtered.is_empty() {
            return Err(SalesError::NoDataAfterFilter.into());
        }
        Ok(filtered)
    }

    pub fn reports(dataset: &Dataset) -> Result<ReportSet> {
        Ok(report::generate(dataset)?)
    }
}

pub fn load_raw(args: &InputArgs, config: &AnalyzerConfig) -> Result<RawTable> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let options = ReadOptions {
        delimiter: args.delimiter,
        encoding,
        sheet: args.sheet.as_deref(),
        max_bytes: config.max_upload_bytes(),
    };
    ingest::read_raw_table(&args.input, &options)
        .with_context(|| format!("Error reading file {:?}", args.input))
}
