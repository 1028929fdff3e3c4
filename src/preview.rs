use anyhow::Result;
use log::info;

use crate::{
    cli::{ColumnsArgs, PreviewArgs},
    columns::ColumnMapping,
    config::AnalyzerConfig,
    session, table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = AnalyzerConfig::load_or_default(args.input.config.as_deref())?;
    let raw = session::load_raw(&args.input, &config)?;
    print!("{}", table::render_raw_preview(&raw, args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        raw.row_count().min(args.rows),
        raw.row_count(),
        args.input.input
    );
    Ok(())
}

/// Lists the detected source column per canonical field without failing on gaps.
pub fn execute_columns(args: &ColumnsArgs) -> Result<()> {
    let config = AnalyzerConfig::load_or_default(args.input.config.as_deref())?;
    let raw = session::load_raw(&args.input, &config)?;
    let mapping = ColumnMapping::detect(&raw.headers, &config.candidates);

    let headers = vec![
        "field".to_string(),
        "column".to_string(),
        "position".to_string(),
    ];
    let rows = mapping
        .entries
        .iter()
        .map(|(field, resolved)| match resolved {
            Some(column) => vec![
                field.to_string(),
                column.name.clone(),
                (column.index + 1).to_string(),
            ],
            None => vec![field.to_string(), "<missing>".to_string(), String::new()],
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);

    if mapping.is_complete() {
        info!("All required fields resolved from {:?}", args.input.input);
    } else {
        info!(
            "{} required field(s) unresolved in {:?}",
            mapping.missing().len(),
            args.input.input
        );
    }
    Ok(())
}
