pub mod analyze;
pub mod clean;
pub mod cli;
pub mod columns;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod io_utils;
pub mod preview;
pub mod report;
pub mod schema;
pub mod session;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

pub use crate::{
    clean::{CleanOutcome, Dataset, SaleRecord, clean, prepare},
    error::SalesError,
    filter::{DateRange, FilterSpec},
    report::{ReportSet, generate},
    schema::{CanonicalField, NormalizedRow, normalize},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_analyzer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Preview(args) => preview::execute(&args),
        Commands::Columns(args) => preview::execute_columns(&args),
        Commands::Report(args) => analyze::execute(&args),
        Commands::Export(args) => export::execute(&args),
    }
}
